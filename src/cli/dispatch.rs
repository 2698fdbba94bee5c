use super::backup::{cmd_backup, cmd_restore};
use super::config::cmd_config;
use super::env::CliArgs;
use super::puzzle::{cmd_delete, cmd_finish, cmd_list, cmd_resume, cmd_show, cmd_start, cmd_update};
use super::scrape::cmd_scrape;
use super::solve::cmd_solve;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Start(args) => cmd_start(args, ctx).await,
        Commands::Finish(args) => cmd_finish(args, ctx).await,
        Commands::Resume(args) => cmd_resume(args, ctx).await,
        Commands::Update(args) => cmd_update(args, ctx).await,
        Commands::List(args) => cmd_list(args, ctx).await,
        Commands::Show(args) => cmd_show(args, ctx).await,
        Commands::Delete(args) => cmd_delete(args, ctx).await,
        Commands::Backup(args) => cmd_backup(args, ctx).await,
        Commands::Restore(args) => cmd_restore(args, ctx).await,
        Commands::Scrape(args) => cmd_scrape(args, ctx).await,
        Commands::Solve(args) => cmd_solve(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
