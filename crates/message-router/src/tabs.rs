use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::RouterError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    pub title: String,
}

const INTERNAL_SCHEMES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "edge://",
    "about:",
    "moz-extension://",
    "view-source:",
];

impl TabInfo {
    /// Browser-owned pages content scripts can never be injected into.
    pub fn is_internal(&self) -> bool {
        INTERNAL_SCHEMES
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

/// Tab and window capabilities provided by the browser.
#[async_trait]
pub trait TabHost: Send + Sync {
    async fn active_tab(&self) -> Option<TabInfo>;
    async fn tab(&self, id: TabId) -> Option<TabInfo>;
    async fn open_tab(&self, url: &str) -> Result<TabInfo, RouterError>;
}

#[derive(Default)]
struct TabTable {
    tabs: BTreeMap<TabId, TabInfo>,
    active: Option<TabId>,
    next_id: u32,
}

/// Tab host kept in memory; used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryTabHost {
    table: RwLock<TabTable>,
}

impl InMemoryTabHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tab and focuses it.
    pub fn open(&self, url: &str, title: &str) -> TabInfo {
        let mut table = self.table.write();
        table.next_id += 1;
        let info = TabInfo {
            id: TabId(table.next_id),
            url: url.to_string(),
            title: title.to_string(),
        };
        table.tabs.insert(info.id, info.clone());
        table.active = Some(info.id);
        debug!(tab = %info.id, url, "tab opened");
        info
    }

    pub fn activate(&self, id: TabId) -> bool {
        let mut table = self.table.write();
        if table.tabs.contains_key(&id) {
            table.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn close(&self, id: TabId) {
        let mut table = self.table.write();
        table.tabs.remove(&id);
        if table.active == Some(id) {
            table.active = None;
        }
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.table.read().tabs.values().cloned().collect()
    }
}

#[async_trait]
impl TabHost for InMemoryTabHost {
    async fn active_tab(&self) -> Option<TabInfo> {
        let table = self.table.read();
        table.active.and_then(|id| table.tabs.get(&id).cloned())
    }

    async fn tab(&self, id: TabId) -> Option<TabInfo> {
        self.table.read().tabs.get(&id).cloned()
    }

    async fn open_tab(&self, url: &str) -> Result<TabInfo, RouterError> {
        Ok(self.open(url, "Puzlog"))
    }
}
