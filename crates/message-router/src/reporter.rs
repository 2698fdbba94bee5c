use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{trace, warn};

use puzlog_core_types::PuzzleId;
use puzlog_puzzle_model::PuzzleUpdate;
use puzlog_stopwatch::TickHandler;

use crate::protocol::{Message, Origin};
use crate::runtime::ExtensionRuntime;

/// Stopwatch tick handler persisting each reading through the service worker.
pub struct ElapsedReporter {
    runtime: Weak<ExtensionRuntime>,
    origin: Origin,
    puzzle_id: PuzzleId,
}

impl ElapsedReporter {
    pub fn new(runtime: Weak<ExtensionRuntime>, origin: Origin, puzzle_id: PuzzleId) -> Self {
        Self {
            runtime,
            origin,
            puzzle_id,
        }
    }
}

#[async_trait]
impl TickHandler for ElapsedReporter {
    async fn on_tick(&self, elapsed: Duration) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        let elapsed_ms = elapsed.as_millis() as u64;
        let message = Message::UpdatePuzzle {
            puzzle_id: self.puzzle_id.clone(),
            updated_values: PuzzleUpdate::elapsed(elapsed_ms),
        };
        match runtime.send_to_worker(self.origin, message).await {
            Ok(_) => trace!(puzzle = %self.puzzle_id, elapsed_ms, "elapsed time persisted"),
            Err(err) => warn!(puzzle = %self.puzzle_id, error = %err, "elapsed time not persisted"),
        }
    }
}
