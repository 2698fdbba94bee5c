//! Puzlog command-line host.
//!
//! Wires the extension contexts (service worker, content scripts, popup) to a
//! file-backed store so puzzles can be tracked from a terminal.

pub mod app_context;
pub mod cli;
pub mod config;

pub use app_context::AppContext;
pub use config::Config;
