use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::errors::StoreError;

/// Emitted by a backend after every successful write or removal.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    /// `None` when the key was removed.
    pub new_value: Option<Value>,
}

/// Extension-local storage: string keys, JSON values, change events.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Every entry, ordered by key.
    async fn entries(&self) -> Result<Vec<(String, Value)>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Writes several entries in one backend operation.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(&key, value).await?;
        }
        Ok(())
    }

    /// Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
