use thiserror::Error;

use puzlog_core_types::PuzlogError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("invalid xpath '{expr}': {reason}")]
    InvalidXPath { expr: String, reason: String },
    #[error("unreadable page snapshot: {0}")]
    Document(String),
}

impl From<MetadataError> for PuzlogError {
    fn from(value: MetadataError) -> Self {
        match value {
            MetadataError::InvalidXPath { .. } => PuzlogError::internal(value.to_string()),
            MetadataError::Document(_) => PuzlogError::usage(value.to_string()),
        }
    }
}
