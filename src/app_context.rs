use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use puzlog_core_types::{Alert, PuzzleId};
use puzlog_metadata_registry::{PageDocument, ProviderRegistry};
use puzlog_message_router::{
    ContentScriptContext, ExtensionRuntime, InMemoryTabHost, Message, MessageKind, Origin,
    PopupClient, Response, RouterError, ServiceWorker, TabHost, WorkerConfig,
};
use puzlog_puzzle_model::{deserialize, PuzzleRecord, PuzzleUpdate};
use puzlog_puzzle_store::{FileStore, KeyValueStore, PuzzleRepository};

use crate::config::Config;

/// Every extension context of one `puzlog` invocation, sharing a single store.
pub struct AppContext {
    config: Arc<Config>,
    repository: PuzzleRepository,
    tabs: Arc<InMemoryTabHost>,
    runtime: Arc<ExtensionRuntime>,
    worker: Arc<ServiceWorker>,
    providers: ProviderRegistry,
}

impl AppContext {
    pub async fn create(config: Arc<Config>) -> Result<Self> {
        let path = config.store_path();
        let store = FileStore::open(path.clone())
            .await
            .with_context(|| format!("Failed to open puzzle store {}", path.display()))?;
        let store: Arc<dyn KeyValueStore> = Arc::new(store);
        Self::with_store(config, store)
    }

    /// Builds the contexts over an already opened store.
    pub fn with_store(config: Arc<Config>, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let repository = PuzzleRepository::new(store);
        let tabs = Arc::new(InMemoryTabHost::new());
        let host: Arc<dyn TabHost> = tabs.clone();
        let runtime = ExtensionRuntime::new(host, config.message_timeout());
        let worker = ServiceWorker::install(
            &runtime,
            repository.clone(),
            WorkerConfig {
                user_id: config.user_id.clone(),
                app_url: config.app_url.clone(),
            },
        )
        .context("Failed to install service worker")?;
        info!(store = %config.store_path().display(), "puzlog context ready");

        Ok(Self {
            config,
            repository,
            tabs,
            runtime,
            worker,
            providers: ProviderRegistry::with_defaults(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &PuzzleRepository {
        &self.repository
    }

    pub fn runtime(&self) -> &Arc<ExtensionRuntime> {
        &self.runtime
    }

    pub fn worker(&self) -> &Arc<ServiceWorker> {
        &self.worker
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn popup(&self) -> PopupClient {
        PopupClient::new(Arc::clone(&self.runtime))
    }

    /// Opens `url` in a focused tab and injects the content script, scraping
    /// `document` when one was captured.
    pub fn open_puzzle(
        &self,
        url: &str,
        title: &str,
        document: Option<&PageDocument>,
    ) -> Result<Arc<ContentScriptContext>> {
        let tab = self.tabs.open(url, title);
        let context = ContentScriptContext::inject(
            &self.runtime,
            tab,
            document,
            &self.providers,
            self.repository.clone(),
        )
        .with_context(|| format!("Failed to inject content script into {url}"))?;
        debug!(puzzle = %context.puzzle_id(), "puzzle page open");
        Ok(context)
    }

    /// Reopens the page of an existing record so popup actions can reach it.
    pub async fn reopen(&self, id: &PuzzleId) -> Result<PuzzleRecord> {
        let record = self.require(id).await?;
        self.open_puzzle(&record.url, &record.title, None)?;
        Ok(record)
    }

    pub async fn require(&self, id: &PuzzleId) -> Result<PuzzleRecord> {
        self.repository
            .load_one(id)
            .await
            .with_context(|| format!("Failed to read puzzle {id}"))?
            .with_context(|| format!("No puzzle recorded for {id}"))
    }

    /// Sends `updatePuzzle` to the service worker as `origin` would.
    pub async fn send_update(
        &self,
        origin: Origin,
        puzzle_id: PuzzleId,
        updated_values: PuzzleUpdate,
    ) -> Result<PuzzleRecord, Alert> {
        let message = Message::UpdatePuzzle {
            puzzle_id,
            updated_values,
        };
        match self.runtime.send_to_worker(origin, message).await? {
            Response::PuzzleState { puzzle_state } => {
                deserialize(puzzle_state).map_err(|err| Alert::from(RouterError::from(err)))
            }
            _ => Err(RouterError::UnexpectedResponse(MessageKind::UpdatePuzzle).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzlog_puzzle_model::PuzzleStatus;
    use puzlog_puzzle_store::MemoryStore;
    use tokio_test::{assert_err, assert_ok};

    fn context() -> AppContext {
        let config = Config {
            user_id: "tester".into(),
            ..Config::default()
        };
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        AppContext::with_store(Arc::new(config), store).unwrap()
    }

    #[tokio::test]
    async fn popup_start_then_app_update() {
        let app = context();
        let url = "https://www.theguardian.com/crosswords/quick/16700#1-across";
        app.open_puzzle(url, "Quick crossword No 16,700", None).unwrap();

        let started = assert_ok!(app.popup().start().await);
        assert_eq!(started.status, PuzzleStatus::Started);
        assert_eq!(started.user_id, "tester");

        let update = PuzzleUpdate {
            notes: Some("gentle".into()),
            ..PuzzleUpdate::default()
        };
        let updated = assert_ok!(app.send_update(Origin::App, started.id.clone(), update).await);
        assert_eq!(updated.notes, "gentle");
        assert_eq!(app.require(&started.id).await.unwrap().notes, "gentle");
    }

    #[tokio::test]
    async fn unknown_puzzles_are_reported() {
        let app = context();
        let id = PuzzleId::from_url("https://example.com/none");
        assert_err!(app.reopen(&id).await);
        let alert = assert_err!(
            app.send_update(Origin::App, id, PuzzleUpdate::elapsed(1_000))
                .await
        );
        assert_eq!(alert.title, "Action not possible");
    }
}
