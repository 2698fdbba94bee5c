use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;
use tracing::info;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct BackupArgs {
    /// Write the backup here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct RestoreArgs {
    /// Backup file produced by `puzlog backup`
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

pub async fn cmd_backup(args: BackupArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let json = app
        .repository()
        .backup()
        .await
        .context("Failed to export puzzles")?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write backup to {}", path.display()))?;
            info!(path = %path.display(), "backup written");
            println!("Backup written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub async fn cmd_restore(args: RestoreArgs, ctx: &CliContext) -> Result<()> {
    let json = fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read backup {}", args.input.display()))?;
    let app = ctx.app_context().await?;
    let count = app
        .repository()
        .restore(&json)
        .await
        .with_context(|| format!("Failed to restore {}", args.input.display()))?;
    println!("Restored {count} puzzles");
    Ok(())
}
