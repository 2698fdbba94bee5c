//! Per-tab content script.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use puzlog_core_types::PuzzleId;
use puzlog_metadata_registry::{PageDocument, ProviderRegistry};
use puzlog_puzzle_model::{
    deserialize, CrosswordMetadata, PersistedPuzzle, PuzzleStatus, PuzzleUpdate,
};
use puzlog_puzzle_store::PuzzleRepository;

use crate::errors::RouterError;
use crate::protocol::{Envelope, Message, MessageKind, Origin, Response};
use crate::router::{handler_fn, MessageRouter};
use crate::runtime::ExtensionRuntime;
use crate::tabs::TabInfo;

/// State of one content-script injection. A navigation creates a new context.
pub struct ContentScriptContext {
    tab: TabInfo,
    puzzle_id: PuzzleId,
    provider: Option<&'static str>,
    metadata: CrosswordMetadata,
    latest: RwLock<Option<PersistedPuzzle>>,
    repository: PuzzleRepository,
    runtime: Weak<ExtensionRuntime>,
}

impl ContentScriptContext {
    /// Scrapes the page, then serves the content-script handlers for `tab`.
    pub fn inject(
        runtime: &Arc<ExtensionRuntime>,
        tab: TabInfo,
        document: Option<&PageDocument>,
        providers: &ProviderRegistry,
        repository: PuzzleRepository,
    ) -> Result<Arc<Self>, RouterError> {
        let puzzle_id = PuzzleId::from_url(&tab.url);
        let resolution = document.and_then(|doc| providers.resolve(&tab.url, doc));
        let (provider, metadata) = match resolution {
            Some(found) => (Some(found.provider), found.metadata),
            None => (None, CrosswordMetadata::default()),
        };

        let context = Arc::new(Self {
            tab,
            puzzle_id,
            provider,
            metadata,
            latest: RwLock::new(None),
            repository,
            runtime: Arc::downgrade(runtime),
        });

        let router = Arc::new(MessageRouter::new(format!("content-script/{}", context.tab.id)));
        for kind in [
            MessageKind::GetContentScriptStatus,
            MessageKind::GetTabPuzzleStatus,
            MessageKind::StateUpdated,
        ] {
            let context = Arc::clone(&context);
            router.on(
                kind,
                handler_fn(move |envelope: Envelope| {
                    let context = Arc::clone(&context);
                    async move { context.handle(envelope).await }
                }),
            )?;
        }
        runtime.attach_tab(context.tab.id, router);
        info!(
            tab = %context.tab.id,
            puzzle = %context.puzzle_id,
            provider = context.provider.unwrap_or("none"),
            "content script injected"
        );
        Ok(context)
    }

    pub fn puzzle_id(&self) -> &PuzzleId {
        &self.puzzle_id
    }

    pub fn tab(&self) -> &TabInfo {
        &self.tab
    }

    pub fn provider(&self) -> Option<&'static str> {
        self.provider
    }

    /// What the page scrape found.
    pub fn metadata(&self) -> &CrosswordMetadata {
        &self.metadata
    }

    /// Last state pushed by the service worker.
    pub fn latest_state(&self) -> Option<PersistedPuzzle> {
        self.latest.read().clone()
    }

    async fn handle(&self, envelope: Envelope) -> Result<Response, RouterError> {
        match envelope.message {
            Message::GetContentScriptStatus => Ok(Response::ContentScriptStatus {
                loaded: true,
                puzzle_id: Some(self.puzzle_id.clone()),
            }),
            Message::GetTabPuzzleStatus => {
                let status = match self.repository.load_one(&self.puzzle_id).await? {
                    Some(record) => record.status,
                    None => PuzzleStatus::NotStarted,
                };
                Ok(Response::TabPuzzleStatus {
                    puzzle_id: self.puzzle_id.clone(),
                    status,
                })
            }
            Message::StateUpdated { puzzle_state } => {
                self.accept_state(puzzle_state).await;
                Ok(Response::Ack)
            }
            other => Err(RouterError::NoHandler(other.kind())),
        }
    }

    async fn accept_state(&self, puzzle_state: PersistedPuzzle) {
        if PuzzleId::from_url(&puzzle_state.id) != self.puzzle_id {
            debug!(tab = %self.tab.id, id = %puzzle_state.id, "state update for another puzzle");
            return;
        }
        *self.latest.write() = Some(puzzle_state.clone());

        let record = match deserialize(puzzle_state) {
            Ok(record) => record,
            Err(err) => {
                warn!(tab = %self.tab.id, error = %err, "unreadable state update");
                return;
            }
        };
        if record.metadata.enrich(&self.metadata) == record.metadata {
            return;
        }
        self.push_metadata().await;
    }

    /// Sends the scraped metadata to the worker so the record gets enriched.
    async fn push_metadata(&self) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        let update = PuzzleUpdate {
            metadata: Some(self.metadata.clone()),
            ..PuzzleUpdate::default()
        };
        let message = Message::UpdatePuzzle {
            puzzle_id: self.puzzle_id.clone(),
            updated_values: update,
        };
        match runtime.send_to_worker(Origin::Tab(self.tab.id), message).await {
            Ok(_) => debug!(tab = %self.tab.id, "scraped metadata sent"),
            Err(err) => warn!(tab = %self.tab.id, error = %err, "could not send scraped metadata"),
        }
    }
}
