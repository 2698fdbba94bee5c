use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use puzlog_event_bus::{EventBus, InMemoryBus};

use crate::errors::StoreError;
use crate::kv::{KeyValueStore, StorageChange};

const CHANGE_CAPACITY: usize = 256;

/// Whole store kept as one pretty-printed JSON object on disk.
///
/// Every write rewrites the file through a temp file and a rename, so a crash
/// leaves either the old or the new contents.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
    bus: Arc<InMemoryBus<StorageChange>>,
}

impl FileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice::<BTreeMap<String, Value>>(&bytes).map_err(|err| {
                StoreError::storage(format!("{} is not a store file: {err}", path.display()))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "starting new store file");
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            bus: InMemoryBus::new(CHANGE_CAPACITY),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &data).await
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>, StoreError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    async fn set_many(&self, batch: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        let mut changes = Vec::with_capacity(batch.len());
        for (key, value) in batch {
            let old_value = next.insert(key.clone(), value.clone());
            changes.push(StorageChange {
                key,
                old_value,
                new_value: Some(value),
            });
        }
        self.persist(&next).await?;
        *entries = next;
        debug!(path = %self.path.display(), writes = changes.len(), "store file written");
        // published under the lock so events keep write order
        for change in changes {
            self.bus.publish(change).await;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        let old_value = next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        self.bus
            .publish(StorageChange {
                key: key.to_string(),
                old_value,
                new_value: None,
            })
            .await;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.bus.subscribe()
    }
}
