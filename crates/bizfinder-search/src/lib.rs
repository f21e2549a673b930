//! Grid-based large-radius business search.
//!
//! A request whose radius exceeds what one upstream call covers is split
//! into overlapping sub-discs ([`grid::partition`]), each sub-disc is
//! searched with pagination and retries ([`fetcher::PageFetcher`]) on a
//! bounded pool ([`executor::run`]), and the per-disc results are merged
//! by `place_id` ([`merge::merge`]). [`SearchOrchestrator`] ties the steps
//! together and records a [`SearchLogEvent`] trail along the way.

pub mod error;
pub mod events;
pub mod executor;
pub mod fetcher;
pub mod grid;
pub mod merge;
pub mod orchestrator;
pub mod request;
mod retry;
pub mod settings;

#[cfg(test)]
mod fake;

pub use error::SearchError;
pub use events::{EventCategory, EventLevel, EventLog, SearchLogEvent};
pub use fetcher::{FailureKind, PageFetcher, SubTaskError, SubTaskOutcome};
pub use orchestrator::{SearchOrchestrator, SearchResult, SearchStats, SubTaskFailure};
pub use request::{SearchRequest, SubSearchTask};
pub use settings::{FetchPolicy, SearchSettings};
