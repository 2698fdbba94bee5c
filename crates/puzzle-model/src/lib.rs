//! Puzzle record model for Puzlog.
//!
//! A [`PuzzleRecord`] is the persisted entity tracking one solving session. The
//! record is stored in its flat [`PersistedPuzzle`] form; [`serialize`] and
//! [`deserialize`] convert between the two and are lossless for well-formed records.

pub mod codec;
pub mod errors;
pub mod lifecycle;
pub mod model;
pub mod update;

pub use codec::{deserialize, deserialize_at, deserialize_value, serialize, PersistedMetadata, PersistedPuzzle};
pub use errors::ModelError;
pub use model::{CrosswordMetadata, PuzzleRecord, PuzzleStatus, TimerState};
pub use update::PuzzleUpdate;
