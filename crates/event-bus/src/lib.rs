use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

/// Best-effort pub/sub: events published while nobody listens are dropped.
#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Returns how many subscribers the event was handed to.
    async fn publish(&self, event: E) -> usize;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-memory bus shared by every context living in the same process.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    async fn publish(&self, event: E) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(dropped)) => {
                trace!(?dropped, "no subscribers; event dropped");
                0
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = InMemoryBus::<String>::new(4);
        assert_eq!(bus.publish("lost".into()).await, 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_events_in_order() {
        let bus = InMemoryBus::<u32>::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.publish(1).await, 2);
        assert_eq!(bus.publish(2).await, 2);
        assert_eq!(first.recv().await.unwrap(), 1);
        assert_eq!(first.recv().await.unwrap(), 2);
        assert_eq!(second.recv().await.unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 2);
    }
}
