use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use puzlog_core_types::PuzzleId;
use puzlog_message_router::{ElapsedReporter, Origin};
use puzlog_puzzle_model::{PuzzleStatus, PuzzleUpdate};
use puzlog_stopwatch::{Stopwatch, TickHandler};

use super::context::CliContext;
use super::output::{alert_error, format_elapsed, print_record};

#[derive(Args, Clone, Debug)]
pub struct SolveArgs {
    /// Puzzle id or page url
    pub id: String,

    /// How long to keep the stopwatch running
    #[arg(long, value_name = "S")]
    pub seconds: u64,

    #[arg(long)]
    pub json: bool,
}

pub async fn cmd_solve(args: SolveArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let id = PuzzleId::from_url(&args.id);
    let record = app.require(&id).await?;
    if record.status != PuzzleStatus::Started {
        bail!("Puzzle {id} is {}; start or resume it first", record.status);
    }

    let stopwatch = Stopwatch::new();
    stopwatch.set_elapsed(Duration::from_millis(record.elapsed_time));
    let reporter: Arc<dyn TickHandler> = Arc::new(ElapsedReporter::new(
        Arc::downgrade(app.runtime()),
        Origin::App,
        id.clone(),
    ));
    stopwatch.start(reporter, app.config().tick_interval())?;
    info!(
        %id,
        from = %format_elapsed(record.elapsed_time),
        seconds = args.seconds,
        "stopwatch running"
    );

    tokio::time::sleep(Duration::from_secs(args.seconds)).await;
    let elapsed_ms = stopwatch.pause().as_millis() as u64;

    let record = app
        .send_update(Origin::App, id, PuzzleUpdate::elapsed(elapsed_ms))
        .await
        .map_err(alert_error)?;
    print_record(&record, args.json)
}
