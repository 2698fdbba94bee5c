//! Flat persisted form of a puzzle record.
//!
//! Only `userId` (or the older `ownerId`), `id`, `url` and `title` are required when
//! reading. Records written by older builds lack the newer fields, so every other field
//! is optional here and filled in by [`deserialize_at`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use puzlog_core_types::PuzzleId;

use crate::errors::ModelError;
use crate::model::{CrosswordMetadata, PuzzleRecord, PuzzleStatus, TimerState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPuzzle {
    #[serde(alias = "ownerId")]
    pub user_id: String,
    pub id: String,
    pub url: String,
    pub title: String,
    pub storage_key: Option<String>,
    pub status: Option<String>,
    pub timer_state: Option<String>,
    pub time_load: Option<String>,
    pub time_last_access: Option<String>,
    pub time_start: Option<String>,
    pub time_finish: Option<String>,
    pub elapsed_time: Option<u64>,
    pub hints_or_mistakes: Option<i64>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
    pub metadata: Option<PersistedMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMetadata {
    pub series: Option<String>,
    pub title: Option<String>,
    pub setter: Option<String>,
    pub date_published: Option<String>,
}

pub fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn decode_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ModelError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| ModelError::date_format(field, raw))
}

pub fn serialize(record: &PuzzleRecord) -> PersistedPuzzle {
    PersistedPuzzle {
        user_id: record.user_id.clone(),
        id: record.id.as_str().to_string(),
        url: record.url.clone(),
        title: record.title.clone(),
        storage_key: Some(record.storage_key().to_string()),
        status: Some(record.status.as_str().to_string()),
        timer_state: Some(record.timer_state.as_str().to_string()),
        time_load: Some(encode_timestamp(&record.time_load)),
        time_last_access: Some(encode_timestamp(&record.time_last_access)),
        time_start: Some(encode_timestamp(&record.time_start)),
        time_finish: record.time_finish.as_ref().map(encode_timestamp),
        elapsed_time: Some(record.elapsed_time),
        hints_or_mistakes: record.hints_or_mistakes,
        rating: record.rating,
        notes: Some(record.notes.clone()),
        metadata: Some(PersistedMetadata::from(&record.metadata)),
    }
}

pub fn deserialize(persisted: PersistedPuzzle) -> Result<PuzzleRecord, ModelError> {
    deserialize_at(persisted, Utc::now())
}

/// Decodes a raw JSON value; missing required fields surface as `Malformed`.
pub fn deserialize_value(value: serde_json::Value) -> Result<PuzzleRecord, ModelError> {
    let persisted: PersistedPuzzle =
        serde_json::from_value(value).map_err(|err| ModelError::Malformed(err.to_string()))?;
    deserialize(persisted)
}

/// Applies the documented defaults, using `now` for load/start/last-access fields.
pub fn deserialize_at(
    persisted: PersistedPuzzle,
    now: DateTime<Utc>,
) -> Result<PuzzleRecord, ModelError> {
    let id = PuzzleId::from_url(&persisted.id);
    if let Some(stored_key) = persisted.storage_key.as_deref() {
        if stored_key != id.storage_key().as_str() {
            warn!(stored_key, id = %id, "stored key disagrees with id; using derived key");
        }
    }

    let time_load = required_timestamp("timeLoad", persisted.time_load.as_deref(), now)?;
    let time_last_access =
        required_timestamp("timeLastAccess", persisted.time_last_access.as_deref(), now)?;
    let time_start = required_timestamp("timeStart", persisted.time_start.as_deref(), now)?;
    let time_finish = persisted
        .time_finish
        .as_deref()
        .map(|raw| decode_timestamp("timeFinish", raw))
        .transpose()?;

    Ok(PuzzleRecord {
        user_id: persisted.user_id,
        id,
        url: persisted.url,
        title: persisted.title,
        status: persisted
            .status
            .as_deref()
            .map(PuzzleStatus::decode)
            .unwrap_or_default(),
        timer_state: persisted
            .timer_state
            .as_deref()
            .map(TimerState::decode)
            .unwrap_or_default(),
        time_load,
        time_last_access,
        time_start,
        time_finish,
        elapsed_time: persisted.elapsed_time.unwrap_or(0),
        hints_or_mistakes: persisted.hints_or_mistakes,
        rating: persisted.rating,
        notes: persisted.notes.unwrap_or_default(),
        metadata: persisted
            .metadata
            .map(CrosswordMetadata::try_from)
            .transpose()?
            .unwrap_or_default(),
    })
}

fn required_timestamp(
    field: &'static str,
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ModelError> {
    match raw {
        Some(raw) => decode_timestamp(field, raw),
        None => Ok(now),
    }
}

impl From<&CrosswordMetadata> for PersistedMetadata {
    fn from(value: &CrosswordMetadata) -> Self {
        Self {
            series: value.series.clone(),
            title: value.title.clone(),
            setter: value.setter.clone(),
            date_published: value.date_published.as_ref().map(encode_timestamp),
        }
    }
}

impl TryFrom<PersistedMetadata> for CrosswordMetadata {
    type Error = ModelError;

    fn try_from(value: PersistedMetadata) -> Result<Self, Self::Error> {
        let date_published = value
            .date_published
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(|raw| decode_timestamp("metadata.datePublished", raw))
            .transpose()?;
        Ok(Self {
            series: value.series,
            title: value.title,
            setter: value.setter,
            date_published,
        })
    }
}
