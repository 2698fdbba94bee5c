use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::PersistedMetadata;
use crate::model::{CrosswordMetadata, TimerState};

/// Field edits carried by an `updatePuzzle` message.
///
/// `rating` and `hintsOrMistakes` distinguish "leave alone" (field absent) from
/// "clear" (`null`). Identity, status and lifecycle timestamps are not editable here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PuzzleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub hints_or_mistakes: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_state: Option<TimerState>,
    #[serde(
        default,
        deserialize_with = "metadata_patch",
        serialize_with = "write_metadata_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<CrosswordMetadata>,
}

impl PuzzleUpdate {
    pub fn elapsed(elapsed_ms: u64) -> Self {
        Self {
            elapsed_time: Some(elapsed_ms),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

fn metadata_patch<'de, D>(deserializer: D) -> Result<Option<CrosswordMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<PersistedMetadata>::deserialize(deserializer)?;
    raw.map(CrosswordMetadata::try_from)
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn write_metadata_patch<S>(
    value: &Option<CrosswordMetadata>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    value
        .as_ref()
        .map(PersistedMetadata::from)
        .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_clears_and_absent_keeps() {
        let update: PuzzleUpdate =
            serde_json::from_value(json!({ "rating": null, "notes": "n" })).unwrap();
        assert_eq!(update.rating, Some(None));
        assert_eq!(update.hints_or_mistakes, None);
        assert_eq!(update.notes.as_deref(), Some("n"));
    }

    #[test]
    fn status_is_not_editable() {
        let result = serde_json::from_value::<PuzzleUpdate>(json!({ "status": "Finished" }));
        assert!(result.is_err());
    }

    #[test]
    fn metadata_patch_survives_the_wire() {
        let update: PuzzleUpdate = serde_json::from_value(json!({
            "metadata": { "setter": "Picaroon", "datePublished": "2023-10-26T00:00:00Z" }
        }))
        .unwrap();
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["metadata"]["setter"], "Picaroon");
        let back: PuzzleUpdate = serde_json::from_value(value).unwrap();
        assert_eq!(back, update);
    }
}
