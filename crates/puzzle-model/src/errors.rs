use thiserror::Error;

use puzlog_core_types::PuzlogError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A timestamp field is present but cannot be parsed.
    #[error("invalid date in field '{field}': '{value}'")]
    DateFormat { field: &'static str, value: String },
    #[error("malformed puzzle record: {0}")]
    Malformed(String),
    #[error("{0}")]
    Usage(String),
}

impl ModelError {
    pub fn date_format(field: &'static str, value: impl Into<String>) -> Self {
        Self::DateFormat {
            field,
            value: value.into(),
        }
    }
}

impl From<ModelError> for PuzlogError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::DateFormat { field, value } => PuzlogError::DateFormat {
                field: field.to_string(),
                value,
            },
            ModelError::Malformed(detail) => PuzlogError::internal(detail),
            ModelError::Usage(detail) => PuzlogError::usage(detail),
        }
    }
}
