//! Persistence for puzzle records.
//!
//! Records live in a [`KeyValueStore`] under `"puzzle:" + id`. The
//! [`PuzzleRepository`] owns the codec round trip, isolates unreadable entries
//! and turns backend change events into per-record callbacks.

pub mod errors;
pub mod file;
pub mod kv;
pub mod memory;
pub mod repository;

pub use errors::StoreError;
pub use file::FileStore;
pub use kv::{KeyValueStore, StorageChange};
pub use memory::MemoryStore;
pub use repository::{LoadFailure, LoadReport, PuzzleRepository, Subscription};
