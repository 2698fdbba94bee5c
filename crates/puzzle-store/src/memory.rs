use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use puzlog_event_bus::{EventBus, InMemoryBus};

use crate::errors::StoreError;
use crate::kv::{KeyValueStore, StorageChange};

const CHANGE_CAPACITY: usize = 256;

/// Process-local backend. Writes can be made to fail for tests.
pub struct MemoryStore {
    entries: DashMap<String, Value>,
    bus: Arc<InMemoryBus<StorageChange>>,
    write_failure: RwLock<Option<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            bus: InMemoryBus::new(CHANGE_CAPACITY),
            write_failure: RwLock::new(None),
        }
    }

    /// Every later write or removal fails with `detail` until cleared.
    pub fn fail_writes(&self, detail: impl Into<String>) {
        *self.write_failure.write() = Some(detail.into());
    }

    pub fn clear_failure(&self) {
        *self.write_failure.write() = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        match self.write_failure.read().as_ref() {
            Some(detail) => Err(StoreError::storage(detail.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>, StoreError> {
        let mut out: Vec<(String, Value)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.check_writable()?;
        let old_value = self.entries.insert(key.to_string(), value.clone());
        debug!(key, "memory store write");
        self.bus
            .publish(StorageChange {
                key: key.to_string(),
                old_value,
                new_value: Some(value),
            })
            .await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        if let Some((key, old_value)) = self.entries.remove(key) {
            self.bus
                .publish(StorageChange {
                    key,
                    old_value: Some(old_value),
                    new_value: None,
                })
                .await;
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn writes_emit_changes_with_old_value() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();
        store.set("a", json!(1)).await.unwrap();
        store.set("a", json!(2)).await.unwrap();
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();

        let first = changes.recv().await.unwrap();
        assert_eq!(first.old_value, None);
        let second = changes.recv().await.unwrap();
        assert_eq!(second.old_value, Some(json!(1)));
        assert_eq!(second.new_value, Some(json!(2)));
        let removed = changes.recv().await.unwrap();
        assert_eq!(removed.new_value, None);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn injected_failure_blocks_writes() {
        let store = MemoryStore::new();
        store.fail_writes("quota exceeded");
        let err = store.set("a", json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(ref d) if d == "quota exceeded"));
        assert!(store.is_empty());
        store.clear_failure();
        store.set("a", json!(1)).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
