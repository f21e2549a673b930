use async_trait::async_trait;
use bizfinder_core::{BusinessRecord, Coordinates};

use crate::error::PlacesError;

/// One request for one page of a paginated nearby search.
#[derive(Debug, Clone, Copy)]
pub struct LookupQuery<'a> {
    pub center: Coordinates,
    pub radius_m: f64,
    pub term: &'a str,
    /// Continuation token from the previous page; `None` for the first page.
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct LookupPage {
    pub results: Vec<BusinessRecord>,
    pub next_page_token: Option<String>,
}

/// The upstream places-search capability.
///
/// Implementations fetch exactly one page per call; following tokens,
/// pacing, and retrying are the caller's job.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn lookup(&self, query: LookupQuery<'_>) -> Result<LookupPage, PlacesError>;
}
