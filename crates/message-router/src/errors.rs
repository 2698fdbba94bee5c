use thiserror::Error;

use puzlog_core_types::{Alert, PuzlogError};
use puzlog_puzzle_model::ModelError;
use puzlog_puzzle_store::StoreError;

use crate::protocol::MessageKind;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("{title}: {detail}")]
    UnreachableTab { title: String, detail: String },
    #[error("{target} did not answer within {after_ms} ms")]
    Timeout { target: String, after_ms: u64 },
    #[error("no handler registered for '{0}'")]
    NoHandler(MessageKind),
    #[error("a handler for '{0}' is already registered")]
    DuplicateHandler(MessageKind),
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("channel to {0} closed")]
    ChannelClosed(String),
    #[error("unexpected response to '{0}'")]
    UnexpectedResponse(MessageKind),
}

impl RouterError {
    pub fn unreachable(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnreachableTab {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn usage(detail: impl Into<String>) -> Self {
        Self::Usage(detail.into())
    }
}

impl From<ModelError> for RouterError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::Usage(detail) => RouterError::Usage(detail),
            other => RouterError::Store(StoreError::Model(other)),
        }
    }
}

impl From<RouterError> for PuzlogError {
    fn from(value: RouterError) -> Self {
        match value {
            RouterError::UnreachableTab { title, detail } => {
                PuzlogError::UnreachableTab { title, detail }
            }
            RouterError::Timeout { .. } => PuzlogError::UnreachableTab {
                title: "Puzlog is not responding".into(),
                detail: value.to_string(),
            },
            RouterError::Usage(detail) => PuzlogError::Usage(detail),
            RouterError::Store(err) => err.into(),
            RouterError::NoHandler(_)
            | RouterError::DuplicateHandler(_)
            | RouterError::ChannelClosed(_)
            | RouterError::UnexpectedResponse(_) => PuzlogError::internal(value.to_string()),
        }
    }
}

impl From<RouterError> for Alert {
    fn from(value: RouterError) -> Self {
        Alert::from(&PuzlogError::from(value))
    }
}
