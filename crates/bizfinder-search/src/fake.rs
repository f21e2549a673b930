//! Scripted [`PlaceLookup`] for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bizfinder_core::BusinessRecord;
use bizfinder_places::{LookupPage, LookupQuery, PlaceLookup, PlacesError};

pub(crate) struct FnLookup<F> {
    respond: F,
    calls: AtomicUsize,
}

impl<F> FnLookup<F>
where
    F: Fn(LookupQuery<'_>) -> Result<LookupPage, PlacesError> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> PlaceLookup for FnLookup<F>
where
    F: Fn(LookupQuery<'_>) -> Result<LookupPage, PlacesError> + Send + Sync,
{
    async fn lookup(&self, query: LookupQuery<'_>) -> Result<LookupPage, PlacesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(query)
    }
}

pub(crate) fn named(place_id: &str, name: &str) -> BusinessRecord {
    let mut record = BusinessRecord::new(place_id);
    record.name = Some(name.to_owned());
    record
}

pub(crate) fn page(ids: &[&str], next: Option<&str>) -> LookupPage {
    LookupPage {
        results: ids.iter().map(|id| named(id, id)).collect(),
        next_page_token: next.map(str::to_owned),
    }
}

pub(crate) fn denied() -> PlacesError {
    PlacesError::Api {
        status: "REQUEST_DENIED".to_owned(),
        message: "The provided API key is invalid.".to_owned(),
    }
}

pub(crate) fn over_limit() -> PlacesError {
    PlacesError::Api {
        status: "OVER_QUERY_LIMIT".to_owned(),
        message: "You have exceeded your rate-limit.".to_owned(),
    }
}
