use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use puzlog_core_types::{PuzzleId, StorageKey};

/// Solving status; drives which affordances a UI surface offers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PuzzleStatus {
    NotStarted,
    Started,
    Finished,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PuzzleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PuzzleStatus::NotStarted => "NotStarted",
            PuzzleStatus::Started => "Started",
            PuzzleStatus::Finished => "Finished",
            PuzzleStatus::Unknown => "Unknown",
        }
    }

    /// Never fails: names written by newer builds decode to `Unknown`.
    pub fn decode(raw: &str) -> Self {
        match raw {
            "NotStarted" => PuzzleStatus::NotStarted,
            "Started" => PuzzleStatus::Started,
            "Finished" => PuzzleStatus::Finished,
            _ => PuzzleStatus::Unknown,
        }
    }
}

impl fmt::Display for PuzzleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TimerState {
    Running,
    #[default]
    #[serde(other)]
    Stopped,
}

impl TimerState {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerState::Running => "Running",
            TimerState::Stopped => "Stopped",
        }
    }

    pub fn decode(raw: &str) -> Self {
        match raw {
            "Running" => TimerState::Running,
            _ => TimerState::Stopped,
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields scraped from a provider page. Every field is independently optional.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CrosswordMetadata {
    pub series: Option<String>,
    pub title: Option<String>,
    pub setter: Option<String>,
    pub date_published: Option<DateTime<Utc>>,
}

impl CrosswordMetadata {
    pub fn is_empty(&self) -> bool {
        !has_text(&self.series)
            && !has_text(&self.title)
            && !has_text(&self.setter)
            && self.date_published.is_none()
    }

    /// Field-wise `self || incoming`: known values are kept, gaps are filled.
    pub fn enrich(&self, incoming: &CrosswordMetadata) -> CrosswordMetadata {
        CrosswordMetadata {
            series: pick_text(&self.series, &incoming.series),
            title: pick_text(&self.title, &incoming.title),
            setter: pick_text(&self.setter, &incoming.setter),
            date_published: self.date_published.or(incoming.date_published),
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |text| !text.is_empty())
}

fn pick_text(existing: &Option<String>, incoming: &Option<String>) -> Option<String> {
    if has_text(existing) {
        existing.clone()
    } else if has_text(incoming) {
        incoming.clone()
    } else {
        // keep an explicit empty string rather than collapsing it to absent
        existing.clone().or_else(|| incoming.clone())
    }
}

/// One crossword-solving session.
#[derive(Clone, Debug, PartialEq)]
pub struct PuzzleRecord {
    pub user_id: String,
    pub id: PuzzleId,
    pub url: String,
    pub title: String,
    pub status: PuzzleStatus,
    pub timer_state: TimerState,
    pub time_load: DateTime<Utc>,
    pub time_last_access: DateTime<Utc>,
    pub time_start: DateTime<Utc>,
    pub time_finish: Option<DateTime<Utc>>,
    /// Accumulated working time in milliseconds.
    pub elapsed_time: u64,
    pub hints_or_mistakes: Option<i64>,
    pub rating: Option<i64>,
    pub notes: String,
    pub metadata: CrosswordMetadata,
}

impl PuzzleRecord {
    pub fn storage_key(&self) -> StorageKey {
        self.id.storage_key()
    }
}
