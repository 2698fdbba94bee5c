use thiserror::Error;

use puzlog_core_types::PuzlogError;
use puzlog_puzzle_model::ModelError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused or failed the operation.
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("backup entry {index} is invalid: {source}")]
    Restore {
        index: usize,
        #[source]
        source: ModelError,
    },
}

impl StoreError {
    pub fn storage(detail: impl Into<String>) -> Self {
        Self::Storage(detail.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<StoreError> for PuzlogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Storage(detail) => PuzlogError::Storage(detail),
            StoreError::Model(err) => err.into(),
            StoreError::Serialize(detail) => PuzlogError::usage(detail),
            StoreError::Restore { .. } => PuzlogError::usage(value.to_string()),
        }
    }
}
