//! Local elapsed-time accumulator.
//!
//! A [`Stopwatch`] belongs to the UI surface rendering the live timer. While
//! running it wakes once per interval, recomputes the elapsed time from the
//! instant it was (re)started and hands the reading to a [`TickHandler`]. The
//! handler is awaited before the next tick is taken, so readings reach the
//! handler strictly in order and never overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use puzlog_core_types::PuzlogError;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StopwatchError {
    #[error("stopwatch was never started; call start before resume")]
    NeverStarted,
    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}

impl From<StopwatchError> for PuzlogError {
    fn from(value: StopwatchError) -> Self {
        PuzlogError::usage(value.to_string())
    }
}

#[async_trait]
pub trait TickHandler: Send + Sync {
    async fn on_tick(&self, elapsed: Duration);
}

/// Adapts an async closure into a [`TickHandler`].
pub struct FnTickHandler<F>(F);

#[async_trait]
impl<F, Fut> TickHandler for FnTickHandler<F>
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn on_tick(&self, elapsed: Duration) {
        (self.0)(elapsed).await
    }
}

pub fn tick_fn<F, Fut>(f: F) -> Arc<dyn TickHandler>
where
    F: Fn(Duration) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnTickHandler(f))
}

#[derive(Default)]
struct StopwatchState {
    running: bool,
    /// Elapsed time accumulated before `started_at`.
    baseline: Duration,
    started_at: Option<Instant>,
    handler: Option<Arc<dyn TickHandler>>,
    interval: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl StopwatchState {
    // equivalent to `now - anchor` with `anchor = started_at - baseline`
    fn current(&self, now: Instant) -> Duration {
        match (self.running, self.started_at) {
            (true, Some(started_at)) => self.baseline + now.saturating_duration_since(started_at),
            _ => self.baseline,
        }
    }
}

pub struct Stopwatch {
    state: Arc<Mutex<StopwatchState>>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StopwatchState::default())),
        }
    }

    /// Begins accumulating from the current elapsed value. No-op while running.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        handler: Arc<dyn TickHandler>,
        interval: Duration,
    ) -> Result<(), StopwatchError> {
        if interval.is_zero() {
            return Err(StopwatchError::ZeroInterval);
        }
        let mut state = self.state.lock();
        if state.running {
            return Ok(());
        }
        state.handler = Some(handler);
        state.interval = Some(interval);
        self.launch(&mut state);
        Ok(())
    }

    /// Restarts with the handler and interval registered by the last `start`.
    pub fn resume(&self) -> Result<(), StopwatchError> {
        let mut state = self.state.lock();
        if state.handler.is_none() || state.interval.is_none() {
            return Err(StopwatchError::NeverStarted);
        }
        if state.running {
            return Ok(());
        }
        self.launch(&mut state);
        Ok(())
    }

    /// Stops ticking and freezes the elapsed time. Idempotent.
    pub fn pause(&self) -> Duration {
        let mut state = self.state.lock();
        if !state.running {
            return state.baseline;
        }
        let now = Instant::now();
        state.baseline = state.current(now);
        state.running = false;
        state.started_at = None;
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        debug!(elapsed_ms = state.baseline.as_millis() as u64, "stopwatch paused");
        state.baseline
    }

    /// Aligns the stopwatch with an externally loaded value without touching run state.
    pub fn set_elapsed(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        state.baseline = elapsed;
        if state.running {
            state.started_at = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().current(Instant::now())
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn launch(&self, state: &mut StopwatchState) {
        let (Some(handler), Some(interval)) = (state.handler.clone(), state.interval) else {
            return;
        };
        let token = CancellationToken::new();
        state.running = true;
        state.started_at = Some(Instant::now());
        state.cancel = Some(token.clone());
        debug!(
            baseline_ms = state.baseline.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "stopwatch started"
        );

        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let elapsed = {
                    let mut state = shared.lock();
                    if token.is_cancelled() || !state.running {
                        break;
                    }
                    let now = Instant::now();
                    let elapsed = state.current(now);
                    state.baseline = elapsed;
                    state.started_at = Some(now);
                    elapsed
                };
                trace!(elapsed_ms = elapsed.as_millis() as u64, "tick");
                handler.on_tick(elapsed).await;
            }
        });
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        if let Some(token) = self.state.lock().cancel.take() {
            token.cancel();
        }
    }
}
