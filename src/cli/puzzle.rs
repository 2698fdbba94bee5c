use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use puzlog_core_types::PuzzleId;
use puzlog_message_router::Origin;
use puzlog_puzzle_model::{serialize, PuzzleRecord, PuzzleUpdate};
use puzlog_puzzle_store::KeyValueStore;

use super::context::CliContext;
use super::output::{alert_error, print_json, print_record, print_summary_line};

#[derive(Args, Clone, Debug)]
pub struct StartArgs {
    /// Puzzle page url; any #fragment is ignored for identity
    #[arg(long)]
    pub url: String,

    /// Page title (defaults to the stored title, then the url)
    #[arg(long)]
    pub title: Option<String>,

    /// Print the resulting record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct TransitionArgs {
    /// Puzzle id or page url
    pub id: String,

    /// Print the resulting record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct UpdateArgs {
    /// Puzzle id or page url
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long, conflicts_with = "clear_rating")]
    pub rating: Option<i64>,

    /// Hints taken or mistakes made
    #[arg(long, conflicts_with = "clear_hints")]
    pub hints: Option<i64>,

    #[arg(long)]
    pub clear_rating: bool,

    #[arg(long)]
    pub clear_hints: bool,

    /// Print the resulting record as JSON
    #[arg(long)]
    pub json: bool,
}

impl UpdateArgs {
    fn to_update(&self) -> PuzzleUpdate {
        let rating = if self.clear_rating {
            Some(None)
        } else {
            self.rating.map(Some)
        };
        let hints_or_mistakes = if self.clear_hints {
            Some(None)
        } else {
            self.hints.map(Some)
        };
        PuzzleUpdate {
            title: self.title.clone(),
            notes: self.notes.clone(),
            rating,
            hints_or_mistakes,
            ..PuzzleUpdate::default()
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Print records in their persisted JSON form
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ShowArgs {
    /// Puzzle id or page url
    pub id: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct DeleteArgs {
    /// Puzzle id or page url
    pub id: String,
}

pub async fn cmd_start(args: StartArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let id = PuzzleId::from_url(&args.url);
    let title = match args.title {
        Some(title) => title,
        None => app
            .repository()
            .load_one(&id)
            .await
            .ok()
            .flatten()
            .map(|record| record.title)
            .unwrap_or_else(|| args.url.clone()),
    };

    app.open_puzzle(&args.url, &title, None)?;
    let record = app.popup().start().await.map_err(alert_error)?;
    info!(id = %record.id, "puzzle started");
    print_record(&record, args.json)
}

pub async fn cmd_finish(args: TransitionArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    app.reopen(&PuzzleId::from_url(&args.id)).await?;
    let record = app.popup().finish().await.map_err(alert_error)?;
    print_record(&record, args.json)
}

pub async fn cmd_resume(args: TransitionArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    app.reopen(&PuzzleId::from_url(&args.id)).await?;
    let record = app.popup().resume().await.map_err(alert_error)?;
    print_record(&record, args.json)
}

pub async fn cmd_update(args: UpdateArgs, ctx: &CliContext) -> Result<()> {
    let update = args.to_update();
    if update.is_empty() {
        bail!("Nothing to update: pass --title, --notes, --rating, --hints, --clear-rating or --clear-hints");
    }

    let app = ctx.app_context().await?;
    let record = app
        .send_update(Origin::App, PuzzleId::from_url(&args.id), update)
        .await
        .map_err(alert_error)?;
    print_record(&record, args.json)
}

pub async fn cmd_list(args: ListArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let report = app
        .repository()
        .load_report()
        .await
        .context("Failed to load puzzles")?;
    for failure in &report.failures {
        warn!(key = %failure.key, error = %failure.error, "skipping unreadable puzzle");
    }

    let mut records: Vec<PuzzleRecord> = report.records;
    records.sort_by(|a, b| b.time_last_access.cmp(&a.time_last_access));

    if args.json {
        let persisted: Vec<_> = records.iter().map(serialize).collect();
        return print_json(&persisted);
    }
    if records.is_empty() {
        println!("No puzzles recorded yet");
        return Ok(());
    }
    for record in &records {
        print_summary_line(record);
    }
    Ok(())
}

pub async fn cmd_show(args: ShowArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let record = app.require(&PuzzleId::from_url(&args.id)).await?;
    print_record(&record, args.json)
}

pub async fn cmd_delete(args: DeleteArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let id = PuzzleId::from_url(&args.id);
    let key = id.storage_key();
    let present = app
        .repository()
        .store()
        .get(key.as_str())
        .await
        .context("Failed to read puzzle store")?
        .is_some();
    if !present {
        bail!("No puzzle recorded for {id}");
    }
    app.repository()
        .delete(&key)
        .await
        .with_context(|| format!("Failed to delete {id}"))?;
    println!("Deleted {id}");
    Ok(())
}
