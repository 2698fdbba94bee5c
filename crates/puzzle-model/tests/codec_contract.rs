use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use puzlog_puzzle_model::{
    deserialize, deserialize_at, deserialize_value, serialize, CrosswordMetadata, ModelError,
    PuzzleRecord, PuzzleStatus, TimerState,
};
use serde_json::json;

fn bare_record() -> PuzzleRecord {
    let now = Utc.with_ymd_and_hms(2023, 10, 26, 8, 30, 0).unwrap();
    PuzzleRecord::new("user-1", "https://example.com/x/1", "Bare", now)
}

fn full_record() -> PuzzleRecord {
    let loaded = Utc.timestamp_opt(1_698_300_000, 250_000_000).unwrap();
    let mut record = PuzzleRecord::new(
        "user-2",
        "https://www.theguardian.com/crosswords/cryptic/29211",
        "Cryptic crossword No 29,211",
        loaded,
    );
    record.start(loaded + chrono::Duration::seconds(3)).unwrap();
    record.record_elapsed(754_321, loaded + chrono::Duration::minutes(13));
    record.finish(loaded + chrono::Duration::minutes(14)).unwrap();
    record.hints_or_mistakes = Some(2);
    record.rating = Some(5);
    record.notes = "lovely &lit at 17d".into();
    record.metadata = CrosswordMetadata {
        series: Some("Guardian Cryptic".into()),
        title: Some("Cryptic crossword No 29,211".into()),
        setter: Some("Picaroon".into()),
        date_published: Some(Utc.with_ymd_and_hms(2023, 10, 26, 0, 0, 0).unwrap()),
    };
    record
}

#[test]
fn round_trip_with_optional_fields_absent() {
    let record = bare_record();
    assert_eq!(deserialize(serialize(&record)).unwrap(), record);
}

#[test]
fn round_trip_with_optional_fields_present() {
    let record = full_record();
    assert_eq!(deserialize(serialize(&record)).unwrap(), record);
}

#[test]
fn round_trip_through_json_text() {
    let record = full_record();
    let text = serde_json::to_string(&serialize(&record)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["status"], "Finished");
    assert_eq!(value["storageKey"], format!("puzzle:{}", record.id));
    assert_eq!(deserialize_value(value).unwrap(), record);
}

#[test]
fn round_trip_with_partial_metadata() {
    let mut record = bare_record();
    record.metadata.setter = Some("Paul".into());
    assert_eq!(deserialize(serialize(&record)).unwrap(), record);
}

#[test]
fn unknown_status_decodes_to_unknown() {
    let record = deserialize_value(json!({
        "userId": "u",
        "id": "https://example.com/x/1",
        "url": "https://example.com/x/1",
        "title": "t",
        "status": "Abandoned",
        "timerState": "Sprinting"
    }))
    .unwrap();
    assert_eq!(record.status, PuzzleStatus::Unknown);
    assert_eq!(record.timer_state, TimerState::Stopped);
}

#[test]
fn invalid_required_timestamp_names_field_and_value() {
    let err = deserialize_value(json!({
        "userId": "u",
        "id": "https://example.com/x/1",
        "url": "https://example.com/x/1",
        "title": "t",
        "timeLoad": "invalid-date"
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::DateFormat { field: "timeLoad", .. }));
    let message = err.to_string();
    assert!(message.contains("timeLoad"));
    assert!(message.contains("invalid-date"));
}

#[test]
fn missing_optional_fields_take_defaults() {
    let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let persisted = serde_json::from_value(json!({
        "userId": "u",
        "id": "https://example.com/x/1#1-across",
        "url": "https://example.com/x/1#1-across",
        "title": "t"
    }))
    .unwrap();
    let record = deserialize_at(persisted, now).unwrap();

    assert_eq!(record.id.as_str(), "https://example.com/x/1");
    assert_eq!(record.hints_or_mistakes, None);
    assert_eq!(record.rating, None);
    assert_eq!(record.notes, "");
    assert_eq!(record.status, PuzzleStatus::Unknown);
    assert_eq!(record.timer_state, TimerState::Stopped);
    assert_eq!(record.elapsed_time, 0);
    assert_eq!(record.time_load, now);
    assert_eq!(record.time_start, now);
    assert_eq!(record.time_last_access, now);
    assert_eq!(record.time_finish, None);
    assert!(record.metadata.is_empty());
}

#[test]
fn missing_required_field_is_malformed() {
    let err = deserialize_value(json!({
        "userId": "u",
        "id": "https://example.com/x/1",
        "title": "t"
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::Malformed(_)));
}
