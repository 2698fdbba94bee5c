//! Service-worker side: the only context that writes puzzle records in
//! response to messages.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use puzlog_core_types::PuzzleId;
use puzlog_puzzle_model::{serialize, ModelError, PersistedPuzzle, PuzzleRecord, PuzzleUpdate};
use puzlog_puzzle_store::PuzzleRepository;

use crate::errors::RouterError;
use crate::protocol::{Envelope, Message, MessageKind, Origin, Response};
use crate::router::{handler_fn, MessageRouter};
use crate::runtime::ExtensionRuntime;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Owner stamped on records this worker creates.
    pub user_id: String,
    /// Page `OpenPuzlogTab` opens.
    pub app_url: String,
}

pub struct ServiceWorker {
    repository: PuzzleRepository,
    config: WorkerConfig,
    runtime: Weak<ExtensionRuntime>,
    notifications: mpsc::UnboundedSender<PersistedPuzzle>,
}

impl ServiceWorker {
    /// Registers the worker's handlers and starts serving them on `runtime`.
    pub fn install(
        runtime: &Arc<ExtensionRuntime>,
        repository: PuzzleRepository,
        config: WorkerConfig,
    ) -> Result<Arc<Self>, RouterError> {
        let (notifications, pending) = mpsc::unbounded_channel();
        let worker = Arc::new(Self {
            repository,
            config,
            runtime: Arc::downgrade(runtime),
            notifications,
        });
        tokio::spawn(forward_state_updates(Arc::downgrade(runtime), pending));

        let router = Arc::new(MessageRouter::new("service-worker"));
        for kind in [
            MessageKind::Start,
            MessageKind::Finish,
            MessageKind::Resume,
            MessageKind::UpdatePuzzle,
            MessageKind::OpenPuzlogTab,
        ] {
            let worker = Arc::clone(&worker);
            router.on(
                kind,
                handler_fn(move |envelope: Envelope| {
                    let worker = Arc::clone(&worker);
                    async move { worker.handle(envelope).await }
                }),
            )?;
        }
        runtime.attach_worker(router);
        info!(user_id = %worker.config.user_id, "service worker installed");
        Ok(worker)
    }

    pub fn repository(&self) -> &PuzzleRepository {
        &self.repository
    }

    async fn handle(&self, envelope: Envelope) -> Result<Response, RouterError> {
        match envelope.message {
            Message::Start {
                puzzle_id,
                url,
                title,
            } => self.start(&puzzle_id, &url, &title).await.map(state),
            Message::Finish { puzzle_id } => self.finish(&puzzle_id).await.map(state),
            Message::Resume { puzzle_id } => self.resume(&puzzle_id).await.map(state),
            Message::UpdatePuzzle {
                puzzle_id,
                updated_values,
            } => self.update(&puzzle_id, &updated_values).await.map(state),
            Message::OpenPuzlogTab => self.open_app_tab().await,
            other => Err(RouterError::NoHandler(other.kind())),
        }
    }

    /// Creates the record on first start; later starts restart its timer.
    pub async fn start(
        &self,
        puzzle_id: &PuzzleId,
        url: &str,
        title: &str,
    ) -> Result<PuzzleRecord, RouterError> {
        let now = Utc::now();
        let derived = PuzzleId::from_url(url);
        if &derived != puzzle_id {
            warn!(%puzzle_id, %derived, "start id disagrees with url; using url");
        }
        let record = match self.repository.load_one(&derived).await? {
            Some(mut record) => {
                record.start(now)?;
                record
            }
            None => PuzzleRecord::new_started(self.config.user_id.clone(), url, title, now),
        };
        self.commit(record).await
    }

    async fn transition<F>(
        &self,
        puzzle_id: &PuzzleId,
        apply: F,
    ) -> Result<PuzzleRecord, RouterError>
    where
        F: FnOnce(&mut PuzzleRecord, DateTime<Utc>) -> Result<(), ModelError>,
    {
        let mut record = self.existing(puzzle_id).await?;
        apply(&mut record, Utc::now())?;
        self.commit(record).await
    }

    pub async fn finish(&self, puzzle_id: &PuzzleId) -> Result<PuzzleRecord, RouterError> {
        self.transition(puzzle_id, |record, now| record.finish(now))
            .await
    }

    pub async fn resume(&self, puzzle_id: &PuzzleId) -> Result<PuzzleRecord, RouterError> {
        self.transition(puzzle_id, |record, now| record.resume(now))
            .await
    }

    pub async fn update(
        &self,
        puzzle_id: &PuzzleId,
        update: &PuzzleUpdate,
    ) -> Result<PuzzleRecord, RouterError> {
        self.transition(puzzle_id, |record, now| record.apply_update(update, now))
            .await
    }

    async fn existing(&self, puzzle_id: &PuzzleId) -> Result<PuzzleRecord, RouterError> {
        self.repository
            .load_one(puzzle_id)
            .await?
            .ok_or_else(|| RouterError::usage(format!("no puzzle recorded for {puzzle_id}")))
    }

    async fn commit(&self, record: PuzzleRecord) -> Result<PuzzleRecord, RouterError> {
        self.repository.save(&record).await?;
        debug!(id = %record.id, status = %record.status, "puzzle saved");
        if self.notifications.send(serialize(&record)).is_err() {
            debug!("state update forwarder stopped");
        }
        Ok(record)
    }

    async fn open_app_tab(&self) -> Result<Response, RouterError> {
        let runtime = self
            .runtime
            .upgrade()
            .ok_or_else(|| RouterError::ChannelClosed("extension runtime".into()))?;
        let tab = runtime.host().open_tab(&self.config.app_url).await?;
        info!(tab = %tab.id, url = %tab.url, "puzlog tab opened");
        Ok(Response::TabOpened { tab_id: tab.id })
    }
}

fn state(record: PuzzleRecord) -> Response {
    Response::PuzzleState {
        puzzle_state: serialize(&record),
    }
}

/// Delivers `stateUpdated` to the focused tab, in commit order. Failures are
/// logged only: the tab may have no content script or may have closed.
async fn forward_state_updates(
    runtime: Weak<ExtensionRuntime>,
    mut pending: mpsc::UnboundedReceiver<PersistedPuzzle>,
) {
    while let Some(puzzle_state) = pending.recv().await {
        let Some(runtime) = runtime.upgrade() else {
            break;
        };
        let id = puzzle_state.id.clone();
        match runtime
            .send_to_active_tab(Origin::Worker, Message::StateUpdated { puzzle_state })
            .await
        {
            Ok((tab, _)) => debug!(%id, tab = %tab.id, "state update delivered"),
            Err(err) => debug!(%id, error = %err, "state update not delivered"),
        }
    }
}
