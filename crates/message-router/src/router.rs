use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::errors::RouterError;
use crate::protocol::{Envelope, MessageKind, Response};

#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, envelope: Envelope) -> Result<Response, RouterError>;
}

/// Adapts an async closure into a [`MessageHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, RouterError>> + Send,
{
    async fn handle(&self, envelope: Envelope) -> Result<Response, RouterError> {
        (self.0)(envelope).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, RouterError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Handler table of one context. Each message kind has at most one handler.
pub struct MessageRouter {
    context: String,
    handlers: DashMap<MessageKind, Arc<dyn MessageHandler>>,
}

impl MessageRouter {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            handlers: DashMap::new(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn on(
        &self,
        kind: MessageKind,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), RouterError> {
        match self.handlers.entry(kind) {
            Entry::Occupied(_) => Err(RouterError::DuplicateHandler(kind)),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                trace!(context = %self.context, %kind, "handler registered");
                Ok(())
            }
        }
    }

    pub fn handles(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub async fn dispatch(&self, envelope: Envelope) -> Result<Response, RouterError> {
        let kind = envelope.message.kind();
        let handler = self
            .handlers
            .get(&kind)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RouterError::NoHandler(kind))?;
        debug!(context = %self.context, %kind, id = %envelope.id, "dispatching");
        handler.handle(envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Message, Origin};

    fn ack() -> Arc<dyn MessageHandler> {
        handler_fn(|_| async { Ok(Response::Ack) })
    }

    #[tokio::test]
    async fn second_handler_for_a_kind_is_rejected() {
        let router = MessageRouter::new("worker");
        router.on(MessageKind::OpenPuzlogTab, ack()).unwrap();
        assert!(matches!(
            router.on(MessageKind::OpenPuzlogTab, ack()),
            Err(RouterError::DuplicateHandler(MessageKind::OpenPuzlogTab))
        ));
        let response = router
            .dispatch(Envelope::new(Origin::Popup, Message::OpenPuzlogTab))
            .await
            .unwrap();
        assert_eq!(response, Response::Ack);
    }

    #[tokio::test]
    async fn unhandled_kind_is_an_error() {
        let router = MessageRouter::new("content");
        let err = router
            .dispatch(Envelope::new(Origin::Popup, Message::GetTabPuzzleStatus))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoHandler(MessageKind::GetTabPuzzleStatus)));
    }
}
