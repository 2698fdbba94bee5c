use chrono::{DateTime, Utc};
use tracing::debug;

use puzlog_core_types::PuzzleId;

use crate::errors::ModelError;
use crate::model::{CrosswordMetadata, PuzzleRecord, PuzzleStatus, TimerState};
use crate::update::PuzzleUpdate;

impl PuzzleRecord {
    /// A freshly discovered puzzle; nothing has been timed yet.
    pub fn new(
        user_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        Self {
            user_id: user_id.into(),
            id: PuzzleId::from_url(&url),
            url,
            title: title.into(),
            status: PuzzleStatus::NotStarted,
            timer_state: TimerState::Stopped,
            time_load: now,
            time_last_access: now,
            time_start: now,
            time_finish: None,
            elapsed_time: 0,
            hints_or_mistakes: None,
            rating: None,
            notes: String::new(),
            metadata: CrosswordMetadata::default(),
        }
    }

    /// Record created by the first `start` for a page.
    pub fn new_started(
        user_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::new(user_id, url, title, now);
        record.status = PuzzleStatus::Started;
        record.timer_state = TimerState::Running;
        debug!(id = %record.id, "puzzle created");
        record
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.time_last_access = now;
    }

    /// NotStarted → Started. On a started record only the timer is restarted.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), ModelError> {
        match self.status {
            PuzzleStatus::NotStarted => {
                self.time_start = now;
                self.status = PuzzleStatus::Started;
            }
            PuzzleStatus::Unknown => {
                self.status = PuzzleStatus::Started;
            }
            PuzzleStatus::Started => {}
            PuzzleStatus::Finished => {
                return Err(ModelError::Usage(format!(
                    "puzzle {} is already finished; resume it instead",
                    self.id
                )));
            }
        }
        self.timer_state = TimerState::Running;
        self.touch(now);
        debug!(id = %self.id, "puzzle started");
        Ok(())
    }

    /// Started → Finished.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<(), ModelError> {
        if self.status != PuzzleStatus::Started {
            return Err(ModelError::Usage(format!(
                "cannot finish puzzle {} while it is {}",
                self.id, self.status
            )));
        }
        self.status = PuzzleStatus::Finished;
        self.timer_state = TimerState::Stopped;
        self.time_finish = Some(now);
        self.touch(now);
        debug!(id = %self.id, elapsed_ms = self.elapsed_time, "puzzle finished");
        Ok(())
    }

    /// Finished → Started; `time_start` and `elapsed_time` carry over.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), ModelError> {
        if self.status != PuzzleStatus::Finished {
            return Err(ModelError::Usage(format!(
                "cannot resume puzzle {} while it is {}",
                self.id, self.status
            )));
        }
        self.status = PuzzleStatus::Started;
        self.timer_state = TimerState::Running;
        self.time_finish = None;
        self.touch(now);
        debug!(id = %self.id, "puzzle resumed");
        Ok(())
    }

    /// Accepts a stopwatch reading. Ignored unless the puzzle is started and the
    /// reading does not go backwards.
    pub fn record_elapsed(&mut self, elapsed_ms: u64, now: DateTime<Utc>) -> bool {
        if self.status != PuzzleStatus::Started || elapsed_ms < self.elapsed_time {
            return false;
        }
        self.elapsed_time = elapsed_ms;
        self.touch(now);
        true
    }

    /// Shallow merge of user edits.
    pub fn apply_update(
        &mut self,
        update: &PuzzleUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), ModelError> {
        if let Some(timer_state) = update.timer_state {
            if timer_state == TimerState::Running && self.status != PuzzleStatus::Started {
                return Err(ModelError::Usage(format!(
                    "timer cannot run while puzzle {} is {}",
                    self.id, self.status
                )));
            }
        }

        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(notes) = &update.notes {
            self.notes = notes.clone();
        }
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(hints) = update.hints_or_mistakes {
            self.hints_or_mistakes = hints;
        }
        if let Some(timer_state) = update.timer_state {
            self.timer_state = timer_state;
        }
        if let Some(metadata) = &update.metadata {
            self.metadata = self.metadata.enrich(metadata);
        }
        if let Some(elapsed) = update.elapsed_time {
            if !self.record_elapsed(elapsed, now) {
                debug!(id = %self.id, elapsed, current = self.elapsed_time, "elapsed time update ignored");
            }
        }
        self.touch(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> (PuzzleRecord, DateTime<Utc>) {
        let now = Utc::now();
        (
            PuzzleRecord::new("user", "https://example.com/x/1#3-down", "Puzzle", now),
            now,
        )
    }

    #[test]
    fn start_finish_resume_keeps_start_time() {
        let (mut puzzle, t0) = record();
        assert_eq!(puzzle.id.as_str(), "https://example.com/x/1");

        let t1 = t0 + Duration::seconds(5);
        puzzle.start(t1).unwrap();
        assert_eq!(puzzle.status, PuzzleStatus::Started);
        assert_eq!(puzzle.time_start, t1);

        assert!(puzzle.record_elapsed(4_000, t1));
        let t2 = t1 + Duration::seconds(60);
        puzzle.finish(t2).unwrap();
        assert_eq!(puzzle.time_finish, Some(t2));
        assert_eq!(puzzle.timer_state, TimerState::Stopped);

        let t3 = t2 + Duration::seconds(60);
        puzzle.resume(t3).unwrap();
        assert_eq!(puzzle.status, PuzzleStatus::Started);
        assert_eq!(puzzle.time_finish, None);
        assert_eq!(puzzle.time_start, t1);
        assert_eq!(puzzle.elapsed_time, 4_000);
        assert_eq!(puzzle.time_last_access, t3);
    }

    #[test]
    fn new_started_record_is_running() {
        let now = Utc::now();
        let puzzle = PuzzleRecord::new_started("user", "https://example.com/x/2", "P", now);
        assert_eq!(puzzle.status, PuzzleStatus::Started);
        assert_eq!(puzzle.timer_state, TimerState::Running);
        assert_eq!(puzzle.time_start, now);
        assert_eq!(puzzle.elapsed_time, 0);
    }

    #[test]
    fn restarting_a_started_puzzle_keeps_start_time() {
        let (mut puzzle, t0) = record();
        puzzle.start(t0).unwrap();
        puzzle.start(t0 + Duration::seconds(30)).unwrap();
        assert_eq!(puzzle.time_start, t0);
    }

    #[test]
    fn invalid_transitions_are_usage_errors() {
        let (mut puzzle, now) = record();
        assert!(matches!(puzzle.finish(now), Err(ModelError::Usage(_))));
        assert!(matches!(puzzle.resume(now), Err(ModelError::Usage(_))));
        puzzle.start(now).unwrap();
        puzzle.finish(now).unwrap();
        assert!(matches!(puzzle.start(now), Err(ModelError::Usage(_))));
    }

    #[test]
    fn elapsed_time_is_frozen_unless_started() {
        let (mut puzzle, now) = record();
        assert!(!puzzle.record_elapsed(1_000, now));
        puzzle.start(now).unwrap();
        assert!(puzzle.record_elapsed(2_000, now));
        assert!(!puzzle.record_elapsed(1_500, now));
        puzzle.finish(now).unwrap();
        assert!(!puzzle.record_elapsed(9_000, now));
        assert_eq!(puzzle.elapsed_time, 2_000);
    }

    #[test]
    fn update_merges_annotations() {
        let (mut puzzle, now) = record();
        puzzle.rating = Some(2);
        let update = PuzzleUpdate {
            notes: Some("tricky anagram in 12ac".into()),
            rating: Some(None),
            hints_or_mistakes: Some(Some(3)),
            ..PuzzleUpdate::default()
        };
        puzzle.apply_update(&update, now).unwrap();
        assert_eq!(puzzle.notes, "tricky anagram in 12ac");
        assert_eq!(puzzle.rating, None);
        assert_eq!(puzzle.hints_or_mistakes, Some(3));
    }

    #[test]
    fn timer_cannot_run_on_finished_puzzle() {
        let (mut puzzle, now) = record();
        puzzle.start(now).unwrap();
        puzzle.finish(now).unwrap();
        let update = PuzzleUpdate {
            timer_state: Some(TimerState::Running),
            ..PuzzleUpdate::default()
        };
        assert!(puzzle.apply_update(&update, now).is_err());
        assert_eq!(puzzle.timer_state, TimerState::Stopped);
    }
}
