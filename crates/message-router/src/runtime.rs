//! In-process stand-in for the browser's extension messaging.
//!
//! Every context (the service worker, one content script per tab) is a tokio
//! task draining its own inbox one message at a time, so handlers of a single
//! context never run concurrently. Senders wait for the reply for at most the
//! configured timeout.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::RouterError;
use crate::protocol::{Envelope, Message, Origin, Response};
use crate::router::MessageRouter;
use crate::tabs::{TabHost, TabId, TabInfo};

pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_millis(2000);
const INBOX_CAPACITY: usize = 64;

struct Request {
    envelope: Envelope,
    reply: oneshot::Sender<Result<Response, RouterError>>,
}

struct Endpoint {
    label: String,
    inbox: mpsc::Sender<Request>,
    cancel: CancellationToken,
}

impl Endpoint {
    fn spawn(label: String, router: Arc<MessageRouter>) -> Self {
        let (inbox, mut requests) = mpsc::channel::<Request>(INBOX_CAPACITY);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task_label = label.clone();
        tokio::spawn(async move {
            loop {
                let request = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    request = requests.recv() => match request {
                        Some(request) => request,
                        None => break,
                    },
                };
                let result = router.dispatch(request.envelope).await;
                if request.reply.send(result).is_err() {
                    debug!(context = %task_label, "sender stopped waiting for the reply");
                }
            }
            debug!(context = %task_label, "context stopped");
        });
        Self {
            label,
            inbox,
            cancel,
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns the context endpoints and routes messages between them.
pub struct ExtensionRuntime {
    host: Arc<dyn TabHost>,
    worker: RwLock<Option<Endpoint>>,
    tabs: DashMap<TabId, Endpoint>,
    timeout: Duration,
}

impl ExtensionRuntime {
    pub fn new(host: Arc<dyn TabHost>, timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            host,
            worker: RwLock::new(None),
            tabs: DashMap::new(),
            timeout,
        })
    }

    pub fn host(&self) -> &Arc<dyn TabHost> {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts serving the service worker's router. Replaces a previous worker.
    pub fn attach_worker(&self, router: Arc<MessageRouter>) {
        let endpoint = Endpoint::spawn("service-worker".into(), router);
        if self.worker.write().replace(endpoint).is_some() {
            info!("service worker restarted");
        }
    }

    /// Starts serving a content script injected into `tab`.
    pub fn attach_tab(&self, tab: TabId, router: Arc<MessageRouter>) {
        let endpoint = Endpoint::spawn(format!("content-script/{tab}"), router);
        if self.tabs.insert(tab, endpoint).is_some() {
            debug!(%tab, "content script re-injected");
        }
    }

    /// Tears down the content script of `tab`, e.g. on navigation.
    pub fn detach_tab(&self, tab: TabId) {
        if self.tabs.remove(&tab).is_some() {
            debug!(%tab, "content script detached");
        }
    }

    pub async fn active_tab(&self) -> Option<TabInfo> {
        self.host.active_tab().await
    }

    pub async fn send_to_worker(
        &self,
        origin: Origin,
        message: Message,
    ) -> Result<Response, RouterError> {
        let (label, inbox) = {
            let worker = self.worker.read();
            let endpoint = worker
                .as_ref()
                .ok_or_else(|| RouterError::ChannelClosed("service-worker".into()))?;
            (endpoint.label.clone(), endpoint.inbox.clone())
        };
        self.request(label, inbox, Envelope::new(origin, message))
            .await
    }

    pub async fn send_to_tab(
        &self,
        tab: TabId,
        origin: Origin,
        message: Message,
    ) -> Result<Response, RouterError> {
        let info = self.host.tab(tab).await.ok_or_else(|| {
            RouterError::unreachable("Tab not found", format!("{tab} is no longer open"))
        })?;
        self.send_to_known_tab(&info, origin, message).await
    }

    /// Sends to whichever tab currently has focus.
    pub async fn send_to_active_tab(
        &self,
        origin: Origin,
        message: Message,
    ) -> Result<(TabInfo, Response), RouterError> {
        let info = self.host.active_tab().await.ok_or_else(|| {
            RouterError::unreachable("No active tab", "open a puzzle page first")
        })?;
        let response = self.send_to_known_tab(&info, origin, message).await?;
        Ok((info, response))
    }

    async fn send_to_known_tab(
        &self,
        info: &TabInfo,
        origin: Origin,
        message: Message,
    ) -> Result<Response, RouterError> {
        if info.is_internal() {
            return Err(RouterError::unreachable(
                "Cannot access this page",
                format!("{} is a browser page extensions cannot read", info.url),
            ));
        }
        let (label, inbox) = self
            .tabs
            .get(&info.id)
            .map(|endpoint| (endpoint.label.clone(), endpoint.inbox.clone()))
            .ok_or_else(|| {
                RouterError::unreachable(
                    "Puzlog is not running on this page",
                    format!("no content script in {} ({})", info.id, info.url),
                )
            })?;
        self.request(label, inbox, Envelope::new(origin, message))
            .await
    }

    async fn request(
        &self,
        label: String,
        inbox: mpsc::Sender<Request>,
        envelope: Envelope,
    ) -> Result<Response, RouterError> {
        let kind = envelope.message.kind();
        let outcome = timeout(self.timeout, exchange(&label, inbox, envelope)).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(target_context = %label, %kind, "message timed out");
                Err(RouterError::Timeout {
                    target: label,
                    after_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

async fn exchange(
    label: &str,
    inbox: mpsc::Sender<Request>,
    envelope: Envelope,
) -> Result<Response, RouterError> {
    let (reply, answer) = oneshot::channel();
    inbox
        .send(Request { envelope, reply })
        .await
        .map_err(|_| RouterError::ChannelClosed(label.to_string()))?;
    answer
        .await
        .map_err(|_| RouterError::ChannelClosed(label.to_string()))?
}
