use clap::Subcommand;

use super::backup::{BackupArgs, RestoreArgs};
use super::config::ConfigArgs;
use super::puzzle::{DeleteArgs, ListArgs, ShowArgs, StartArgs, TransitionArgs, UpdateArgs};
use super::scrape::ScrapeArgs;
use super::solve::SolveArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start timing a puzzle page (creates the record on first start)
    Start(StartArgs),

    /// Mark a started puzzle as finished
    Finish(TransitionArgs),

    /// Reopen a finished puzzle
    Resume(TransitionArgs),

    /// Edit notes, rating, hints or title of a puzzle
    Update(UpdateArgs),

    /// List recorded puzzles
    List(ListArgs),

    /// Show one puzzle record
    Show(ShowArgs),

    /// Delete a puzzle record
    Delete(DeleteArgs),

    /// Export every readable record as JSON
    Backup(BackupArgs),

    /// Replace records from a backup file
    Restore(RestoreArgs),

    /// Scrape crossword metadata from a captured page snapshot
    Scrape(ScrapeArgs),

    /// Run the solving stopwatch for a started puzzle
    Solve(SolveArgs),

    /// Configuration management
    Config(ConfigArgs),
}
