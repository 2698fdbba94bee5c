//! Puzzle-provider scrapers.
//!
//! The content script captures a [`PageDocument`] for the page it was injected
//! into. The [`ProviderRegistry`] picks the first provider whose `test` accepts
//! the page and lets it scrape [`CrosswordMetadata`](puzlog_puzzle_model::CrosswordMetadata);
//! [`enrich_metadata`] folds the result into what a record already knows.

pub mod document;
pub mod errors;
pub mod merge;
pub mod provider;
pub mod providers;
pub mod xpath;

pub use document::{normalize_space, DomNode, PageDocument};
pub use errors::MetadataError;
pub use merge::enrich_metadata;
pub use provider::{parse_published_date, MetadataProvider, PartialMetadata, ProviderRegistry, Resolution};
pub use providers::{GuardianProvider, NewYorkTimesProvider, TimesProvider};
pub use xpath::XPath;
