use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace prefix shared by every persisted puzzle entry.
pub const STORAGE_PREFIX: &str = "puzzle";

/// Error domain shared by the Puzlog crates. Component errors convert into it
/// before they reach a UI surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuzlogError {
    #[error("invalid date in field '{field}': '{value}'")]
    DateFormat { field: String, value: String },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{title}: {detail}")]
    UnreachableTab { title: String, detail: String },
    #[error("usage error: {0}")]
    Usage(String),
    #[error("{0}")]
    Internal(String),
}

impl PuzlogError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PuzlogError::Internal(_))
    }
}

/// Uniform payload UI surfaces render as a dismissible notice.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&PuzlogError> for Alert {
    fn from(err: &PuzlogError) -> Self {
        match err {
            PuzlogError::DateFormat { field, value } => Alert::new(
                "Unreadable puzzle",
                format!("The stored value '{value}' for '{field}' is not a valid date."),
            ),
            PuzlogError::Storage(detail) => Alert::new("Could not save", detail.clone()),
            PuzlogError::UnreachableTab { title, detail } => Alert::new(title, detail),
            PuzlogError::Usage(detail) => Alert::new("Action not possible", detail.clone()),
            PuzlogError::Internal(detail) => Alert::new("Something went wrong", detail.clone()),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Strips any `#fragment` from a puzzle page url.
pub fn id_from_url(url: &str) -> String {
    match url.split_once('#') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

/// Stable puzzle identity derived from the canonical page url.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleId(String);

impl PuzzleId {
    pub fn from_url(url: &str) -> Self {
        Self(id_from_url(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::from(self)
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PuzzleId {
    fn from(value: &str) -> Self {
        Self::from_url(value)
    }
}

impl From<String> for PuzzleId {
    fn from(value: String) -> Self {
        Self::from_url(&value)
    }
}

/// Key a puzzle record is persisted under: `"puzzle:" + id`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Accepts raw keys read back from a store; `None` outside the puzzle namespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(STORAGE_PREFIX)?.strip_prefix(':')?;
        if rest.is_empty() {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn puzzle_id(&self) -> PuzzleId {
        let id = &self.0[STORAGE_PREFIX.len() + 1..];
        PuzzleId(id.to_string())
    }

    pub fn is_puzzle_key(raw: &str) -> bool {
        Self::parse(raw).is_some()
    }
}

impl From<&PuzzleId> for StorageKey {
    fn from(id: &PuzzleId) -> Self {
        Self(format!("{STORAGE_PREFIX}:{}", id.0))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
