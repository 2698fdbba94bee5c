use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use puzlog_core_types::PuzzleId;
use puzlog_metadata_registry::{PageDocument, ProviderRegistry};
use puzlog_message_router::{
    handler_fn, ContentScriptContext, ElapsedReporter, ExtensionRuntime, InMemoryTabHost, Message,
    MessageKind, MessageRouter, Origin, PopupClient, Response, RouterError, ServiceWorker,
    TabInfo, WorkerConfig,
};
use puzlog_puzzle_model::{PuzzleStatus, PuzzleUpdate, TimerState};
use puzlog_puzzle_store::{MemoryStore, PuzzleRepository};
use puzlog_stopwatch::Stopwatch;

const GUARDIAN_URL: &str = "https://www.theguardian.com/crosswords/cryptic/29211";
const APP_URL: &str = "chrome-extension://puzlog/index.html";

struct Harness {
    host: Arc<InMemoryTabHost>,
    runtime: Arc<ExtensionRuntime>,
    store: Arc<MemoryStore>,
    repository: PuzzleRepository,
    popup: PopupClient,
    _worker: Arc<ServiceWorker>,
}

fn harness() -> Harness {
    let host = Arc::new(InMemoryTabHost::new());
    let runtime = ExtensionRuntime::new(host.clone(), Duration::from_secs(2));
    let store = Arc::new(MemoryStore::new());
    let repository = PuzzleRepository::new(store.clone());
    let worker = ServiceWorker::install(
        &runtime,
        repository.clone(),
        WorkerConfig {
            user_id: "solver-1".into(),
            app_url: APP_URL.into(),
        },
    )
    .unwrap();
    Harness {
        popup: PopupClient::new(Arc::clone(&runtime)),
        host,
        runtime,
        store,
        repository,
        _worker: worker,
    }
}

fn guardian_page() -> PageDocument {
    PageDocument::from_json(include_str!(
        "../../metadata-registry/tests/fixtures/guardian_cryptic_29211.json"
    ))
    .unwrap()
}

impl Harness {
    fn open_puzzle(&self, url: &str, doc: Option<&PageDocument>) -> (TabInfo, Arc<ContentScriptContext>) {
        let tab = self.host.open(url, "Cryptic crossword No 29,211 | The Guardian");
        let context = ContentScriptContext::inject(
            &self.runtime,
            tab.clone(),
            doc,
            &ProviderRegistry::with_defaults(),
            self.repository.clone(),
        )
        .unwrap();
        (tab, context)
    }
}

async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn start_finish_resume_round_trip() {
    let h = harness();
    let doc = guardian_page();
    let (tab, context) = h.open_puzzle(GUARDIAN_URL, Some(&doc));
    assert_eq!(context.provider(), Some("guardian"));

    let status = h.popup.tab_status().await.unwrap();
    assert_eq!(status.status, PuzzleStatus::NotStarted);

    let started = h.popup.start().await.unwrap();
    assert_eq!(started.status, PuzzleStatus::Started);
    assert_eq!(started.timer_state, TimerState::Running);
    assert_eq!(started.user_id, "solver-1");
    assert_eq!(started.id.as_str(), GUARDIAN_URL);

    let id = PuzzleId::from_url(GUARDIAN_URL);
    let repo = h.repository.clone();
    eventually("scraped metadata on the record", || {
        let repo = repo.clone();
        let id = id.clone();
        async move {
            repo.load_one(&id)
                .await
                .unwrap()
                .map_or(false, |r| r.metadata.series.as_deref() == Some("Guardian Cryptic"))
        }
    })
    .await;

    h.runtime
        .send_to_worker(
            Origin::Tab(tab.id),
            Message::UpdatePuzzle {
                puzzle_id: id.clone(),
                updated_values: PuzzleUpdate::elapsed(61_000),
            },
        )
        .await
        .unwrap();

    let finished = h.popup.finish().await.unwrap();
    assert_eq!(finished.status, PuzzleStatus::Finished);
    assert_eq!(finished.timer_state, TimerState::Stopped);
    assert!(finished.time_finish.is_some());
    assert_eq!(finished.elapsed_time, 61_000);
    assert_eq!(finished.metadata.setter.as_deref(), Some("Picaroon"));

    let resumed = h.popup.resume().await.unwrap();
    assert_eq!(resumed.status, PuzzleStatus::Started);
    assert_eq!(resumed.time_finish, None);
    assert_eq!(resumed.time_start, started.time_start);
    assert_eq!(resumed.elapsed_time, 61_000);

    eventually("content script sees the resumed state", || {
        let resumed_seen = context.latest_state().map_or(false, |state| {
            state.status.as_deref() == Some("Started") && state.time_finish.is_none()
        });
        async move { resumed_seen }
    })
    .await;
}

#[tokio::test]
async fn worker_messages_drive_an_unscraped_page() {
    let h = harness();
    let url = "https://example.com/x/1";
    let id = PuzzleId::from_url(url);
    let start = Message::Start {
        puzzle_id: id.clone(),
        url: url.into(),
        title: "Example".into(),
    };
    let Response::PuzzleState { puzzle_state } =
        h.runtime.send_to_worker(Origin::Popup, start).await.unwrap()
    else {
        panic!("start did not answer with the puzzle state");
    };
    assert_eq!(puzzle_state.status.as_deref(), Some("Started"));
    assert_eq!(puzzle_state.elapsed_time, Some(0));
    let time_start = puzzle_state.time_start.clone();
    assert!(time_start.is_some());

    let finish = Message::Finish { puzzle_id: id.clone() };
    let Response::PuzzleState { puzzle_state } =
        h.runtime.send_to_worker(Origin::Popup, finish).await.unwrap()
    else {
        panic!("finish did not answer with the puzzle state");
    };
    assert_eq!(puzzle_state.status.as_deref(), Some("Finished"));
    assert!(puzzle_state.time_finish.is_some());

    let resume = Message::Resume { puzzle_id: id };
    let Response::PuzzleState { puzzle_state } =
        h.runtime.send_to_worker(Origin::Popup, resume).await.unwrap()
    else {
        panic!("resume did not answer with the puzzle state");
    };
    assert_eq!(puzzle_state.status.as_deref(), Some("Started"));
    assert_eq!(puzzle_state.time_finish, None);
    assert_eq!(puzzle_state.time_start, time_start);
}

#[tokio::test]
async fn finishing_an_unknown_puzzle_is_a_usage_alert() {
    let h = harness();
    h.open_puzzle(GUARDIAN_URL, None);
    let alert = h.popup.finish().await.unwrap_err();
    assert_eq!(alert.title, "Action not possible");
    assert!(alert.message.contains(GUARDIAN_URL));
}

#[tokio::test]
async fn starting_twice_keeps_the_first_start_time() {
    let h = harness();
    h.open_puzzle(GUARDIAN_URL, None);
    let first = h.popup.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = h.popup.start().await.unwrap();
    assert_eq!(second.time_start, first.time_start);
    assert_eq!(h.repository.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn resuming_needs_a_finished_puzzle() {
    let h = harness();
    h.open_puzzle(GUARDIAN_URL, None);
    h.popup.start().await.unwrap();
    let alert = h.popup.resume().await.unwrap_err();
    assert_eq!(alert.title, "Action not possible");
}

#[tokio::test]
async fn internal_pages_are_unreachable() {
    let h = harness();
    h.host.open("chrome://extensions", "Extensions");
    let alert = h.popup.start().await.unwrap_err();
    assert_eq!(alert.title, "Cannot access this page");
}

#[tokio::test]
async fn pages_without_content_script_are_unreachable() {
    let h = harness();
    h.host.open("https://example.com/news", "News");
    let alert = h.popup.tab_status().await.unwrap_err();
    assert_eq!(alert.title, "Puzlog is not running on this page");

    h.host.close(h.host.tabs()[0].id);
    let alert = h.popup.start().await.unwrap_err();
    assert_eq!(alert.title, "No active tab");
}

#[tokio::test(start_paused = true)]
async fn silent_context_times_out() {
    let h = harness();
    let tab = h.host.open(GUARDIAN_URL, "Slow");
    let router = Arc::new(MessageRouter::new("slow"));
    router
        .on(
            MessageKind::GetContentScriptStatus,
            handler_fn(|_| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Response::Ack)
            }),
        )
        .unwrap();
    h.runtime.attach_tab(tab.id, router);

    let err = h
        .runtime
        .send_to_tab(tab.id, Origin::Popup, Message::GetContentScriptStatus)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::Timeout { after_ms: 2000, .. }));
}

#[tokio::test]
async fn state_updates_reach_only_the_focused_tab() {
    let h = harness();
    let (background, background_ctx) = h.open_puzzle(GUARDIAN_URL, None);
    let (focused, focused_ctx) = h.open_puzzle(GUARDIAN_URL, None);
    assert_ne!(background.id, focused.id);

    h.popup.start().await.unwrap();
    eventually("focused tab update", || {
        let seen = focused_ctx.latest_state().is_some();
        async move { seen }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(background_ctx.latest_state().is_none());
}

#[tokio::test]
async fn storage_failure_is_reported_to_the_popup() {
    let h = harness();
    h.open_puzzle(GUARDIAN_URL, None);
    h.store.fail_writes("QUOTA_BYTES quota exceeded");
    let alert = h.popup.start().await.unwrap_err();
    assert_eq!(alert.title, "Could not save");
    assert!(alert.message.contains("quota"));
}

#[tokio::test]
async fn open_app_focuses_a_new_tab() {
    let h = harness();
    let tab_id = h.popup.open_app().await.unwrap();
    let active = h.runtime.active_tab().await.unwrap();
    assert_eq!(active.id, tab_id);
    assert_eq!(active.url, APP_URL);
}

#[tokio::test(start_paused = true)]
async fn stopwatch_ticks_are_persisted() {
    let h = harness();
    let (tab, _context) = h.open_puzzle(GUARDIAN_URL, None);
    let started = h.popup.start().await.unwrap();

    let stopwatch = Stopwatch::new();
    let reporter = ElapsedReporter::new(Arc::downgrade(&h.runtime), Origin::Tab(tab.id), started.id.clone());
    stopwatch
        .start(Arc::new(reporter), Duration::from_secs(1))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;
    stopwatch.pause();

    let record = h.repository.load_one(&started.id).await.unwrap().unwrap();
    assert_eq!(record.elapsed_time, 3_000);
}
