use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use tokio::fs;

use puzlog_message_router::Origin;
use puzlog_metadata_registry::PageDocument;
use puzlog_puzzle_model::{CrosswordMetadata, PersistedMetadata, PuzzleUpdate};

use super::context::CliContext;
use super::output::{alert_error, print_json, print_record};

#[derive(Args, Clone, Debug)]
pub struct ScrapeArgs {
    /// Url the snapshot was captured from
    #[arg(long)]
    pub url: String,

    /// DOM snapshot (CDP `DOM.getDocument` JSON)
    #[arg(long, value_name = "FILE")]
    pub dom: PathBuf,

    /// Merge the scraped metadata into the stored record
    #[arg(long)]
    pub save: bool,

    #[arg(long)]
    pub json: bool,
}

pub async fn cmd_scrape(args: ScrapeArgs, ctx: &CliContext) -> Result<()> {
    let raw = fs::read_to_string(&args.dom)
        .await
        .with_context(|| format!("Failed to read {}", args.dom.display()))?;
    let document = PageDocument::from_json(&raw)
        .with_context(|| format!("Failed to parse page snapshot {}", args.dom.display()))?;

    let app = ctx.app_context().await?;
    let Some(resolution) = app.providers().resolve(&args.url, &document) else {
        println!("No provider recognises {}", args.url);
        return Ok(());
    };

    if !args.save {
        return print_metadata(resolution.provider, &resolution.metadata, args.json);
    }

    let title = resolution
        .metadata
        .title
        .clone()
        .unwrap_or_else(|| args.url.clone());
    let content = app.open_puzzle(&args.url, &title, Some(&document))?;
    let update = PuzzleUpdate {
        metadata: Some(content.metadata().clone()),
        ..PuzzleUpdate::default()
    };
    let origin = Origin::Tab(content.tab().id);
    let record = app
        .send_update(origin, content.puzzle_id().clone(), update)
        .await
        .map_err(alert_error)?;
    print_record(&record, args.json)
}

fn print_metadata(provider: &str, metadata: &CrosswordMetadata, as_json: bool) -> Result<()> {
    if as_json {
        return print_json(&json!({
            "provider": provider,
            "metadata": PersistedMetadata::from(metadata),
        }));
    }
    println!("provider:  {provider}");
    println!("series:    {}", metadata.series.as_deref().unwrap_or("-"));
    println!("title:     {}", metadata.title.as_deref().unwrap_or("-"));
    println!("setter:    {}", metadata.setter.as_deref().unwrap_or("-"));
    match metadata.date_published {
        Some(date) => println!("published: {}", date.format("%Y-%m-%d")),
        None => println!("published: -"),
    }
    Ok(())
}
