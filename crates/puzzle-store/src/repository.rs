use std::cell::Cell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use puzlog_core_types::{PuzzleId, StorageKey};
use puzlog_puzzle_model::{deserialize_value, serialize, ModelError, PuzzleRecord};

use crate::errors::StoreError;
use crate::kv::KeyValueStore;

/// A stored entry that could not be decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadFailure {
    pub key: String,
    pub error: ModelError,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub records: Vec<PuzzleRecord>,
    pub failures: Vec<LoadFailure>,
}

/// Persistence and change-notification boundary for puzzle records.
#[derive(Clone)]
pub struct PuzzleRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PuzzleRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Every decodable record. Broken entries are logged and skipped.
    pub async fn load(&self) -> Result<Vec<PuzzleRecord>, StoreError> {
        Ok(self.load_report().await?.records)
    }

    pub async fn load_report(&self) -> Result<LoadReport, StoreError> {
        let mut report = LoadReport::default();
        for (key, value) in self.store.entries().await? {
            let Some(storage_key) = StorageKey::parse(&key) else {
                continue;
            };
            match decode_entry(&storage_key, value) {
                Ok(record) => report.records.push(record),
                Err(error) => {
                    warn!(key = %key, error = %error, "skipping unreadable puzzle entry");
                    report.failures.push(LoadFailure { key, error });
                }
            }
        }
        debug!(
            loaded = report.records.len(),
            failed = report.failures.len(),
            "puzzles loaded"
        );
        Ok(report)
    }

    pub async fn load_one(&self, id: &PuzzleId) -> Result<Option<PuzzleRecord>, StoreError> {
        let key = id.storage_key();
        match self.store.get(key.as_str()).await? {
            Some(value) => Ok(Some(decode_entry(&key, value)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, record: &PuzzleRecord) -> Result<(), StoreError> {
        let key = record.storage_key();
        let value = serde_json::to_value(serialize(record))?;
        self.store.set(key.as_str(), value).await.map_err(|err| {
            warn!(key = %key, error = %err, "puzzle save failed");
            err
        })
    }

    /// Deleting a missing key succeeds.
    pub async fn delete(&self, key: &StorageKey) -> Result<(), StoreError> {
        self.store.remove(key.as_str()).await?;
        info!(key = %key, "puzzle deleted");
        Ok(())
    }

    /// Calls `callback` with the new record whenever the entry for `id` is written.
    /// Removals are not delivered. Must be called inside a tokio runtime.
    pub fn subscribe_to_changes<F>(&self, id: &PuzzleId, callback: F) -> Subscription
    where
        F: Fn(PuzzleRecord) + Send + Sync + 'static,
    {
        let key = id.storage_key();
        let mut changes = self.store.subscribe();
        let active = Arc::new(ReentrantMutex::new(Cell::new(true)));
        let cancel = CancellationToken::new();

        let task_active = Arc::clone(&active);
        let task_cancel = cancel.clone();
        let task_key = key.clone();
        tokio::spawn(async move {
            loop {
                let change = tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    change = changes.recv() => change,
                };
                let change = match change {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(key = %task_key, skipped, "change listener lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if change.key != task_key.as_str() {
                    continue;
                }
                let Some(value) = change.new_value else {
                    continue;
                };
                let record = match decode_entry(&task_key, value) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(key = %task_key, error = %err, "ignoring unreadable change");
                        continue;
                    }
                };
                let guard = task_active.lock();
                if !guard.get() {
                    break;
                }
                callback(record);
            }
        });

        Subscription {
            key,
            active,
            cancel,
        }
    }

    /// All readable records as a pretty-printed JSON array.
    pub async fn backup(&self) -> Result<String, StoreError> {
        let persisted: Vec<_> = self.load().await?.iter().map(serialize).collect();
        Ok(serde_json::to_string_pretty(&persisted)?)
    }

    /// Re-saves every record of a backup. Nothing is written unless every entry decodes.
    pub async fn restore(&self, json: &str) -> Result<usize, StoreError> {
        let entries: Vec<Value> = serde_json::from_str(json)?;
        let mut batch = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let record = deserialize_value(entry)
                .map_err(|source| StoreError::Restore { index, source })?;
            let value = serde_json::to_value(serialize(&record))?;
            batch.push((record.storage_key().to_string(), value));
        }
        let count = batch.len();
        self.store.set_many(batch).await?;
        info!(count, "backup restored");
        Ok(count)
    }
}

fn decode_entry(key: &StorageKey, value: Value) -> Result<PuzzleRecord, ModelError> {
    let record = deserialize_value(value)?;
    if &record.storage_key() != key {
        warn!(key = %key, id = %record.id, "entry stored under a foreign key");
    }
    Ok(record)
}

/// Keeps a change callback registered. Dropping it unsubscribes.
pub struct Subscription {
    key: StorageKey,
    active: Arc<ReentrantMutex<Cell<bool>>>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Idempotent. Once this returns no further callback starts; an invocation
    /// already running on another thread is waited for. Safe to call from
    /// inside the callback itself.
    pub fn unsubscribe(&self) {
        let guard = self.active.lock();
        if guard.replace(false) {
            debug!(key = %self.key, "change subscription closed");
        }
        self.cancel.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn foreign_key_entry_still_loads() {
        let store = Arc::new(MemoryStore::new());
        let record = PuzzleRecord::new("u", "https://example.com/x/1", "t", Utc::now());
        let value = serde_json::to_value(serialize(&record)).unwrap();
        store.set("puzzle:https://example.com/elsewhere", value).await.unwrap();

        let repo = PuzzleRepository::new(store);
        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[tokio::test]
    async fn keys_outside_the_namespace_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set("settings", serde_json::json!({"theme": "dark"})).await.unwrap();
        store.set("puzzlement:1", serde_json::json!(1)).await.unwrap();
        let report = PuzzleRepository::new(store).load_report().await.unwrap();
        assert!(report.records.is_empty());
        assert!(report.failures.is_empty());
    }
}
