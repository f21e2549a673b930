//! Full pagination of one sub-task against the places capability.

use std::sync::Arc;

use bizfinder_core::BusinessRecord;
use bizfinder_places::{LookupQuery, PlaceLookup, PlacesError};
use serde::Serialize;

use crate::request::SubSearchTask;
use crate::retry::retry_with_backoff;
use crate::settings::FetchPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Still failing after every retry; may succeed on a later run.
    Transient,
    /// Retrying cannot help (denied key, malformed request).
    Fatal,
}

/// Why a sub-task stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTaskError {
    pub kind: FailureKind,
    pub message: String,
    /// 1-based page that failed.
    pub page: usize,
}

impl SubTaskError {
    fn from_places(err: &PlacesError, page: usize) -> Self {
        Self {
            kind: if err.is_transient() {
                FailureKind::Transient
            } else {
                FailureKind::Fatal
            },
            message: err.to_string(),
            page,
        }
    }
}

/// Result of paginating one sub-task.
#[derive(Debug, Clone, PartialEq)]
pub enum SubTaskOutcome {
    /// Every page was fetched, or the page cap was reached.
    Success(Vec<BusinessRecord>),
    /// Pages fetched before a transient failure outlasted its retries.
    PartialFailure {
        records: Vec<BusinessRecord>,
        error: SubTaskError,
    },
    /// A fatal error; nothing from this sub-task is kept.
    FatalFailure(SubTaskError),
}

impl SubTaskOutcome {
    #[must_use]
    pub fn records(&self) -> &[BusinessRecord] {
        match self {
            SubTaskOutcome::Success(records) | SubTaskOutcome::PartialFailure { records, .. } => {
                records
            }
            SubTaskOutcome::FatalFailure(_) => &[],
        }
    }

    #[must_use]
    pub fn into_records(self) -> Vec<BusinessRecord> {
        match self {
            SubTaskOutcome::Success(records) | SubTaskOutcome::PartialFailure { records, .. } => {
                records
            }
            SubTaskOutcome::FatalFailure(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&SubTaskError> {
        match self {
            SubTaskOutcome::Success(_) => None,
            SubTaskOutcome::PartialFailure { error, .. } | SubTaskOutcome::FatalFailure(error) => {
                Some(error)
            }
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SubTaskOutcome::Success(_) => "success",
            SubTaskOutcome::PartialFailure { .. } => "partial",
            SubTaskOutcome::FatalFailure(_) => "failed",
        }
    }
}

/// Walks every page of one sub-task, retrying transient errors.
#[derive(Clone)]
pub struct PageFetcher {
    lookup: Arc<dyn PlaceLookup>,
    policy: FetchPolicy,
}

impl PageFetcher {
    #[must_use]
    pub fn new(lookup: Arc<dyn PlaceLookup>, policy: FetchPolicy) -> Self {
        Self { lookup, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch every page for `task`, up to [`FetchPolicy::max_pages`].
    ///
    /// Continuation pages wait [`FetchPolicy::page_token_delay`] first. A
    /// transient error that survives its retries keeps the pages already
    /// collected; a fatal error discards them. Never returns an `Err`: the
    /// outcome itself carries the failure.
    pub async fn fetch_all(&self, task: &SubSearchTask, term: &str) -> SubTaskOutcome {
        let max_pages = self.policy.max_pages.max(1);
        let mut records = Vec::new();
        let mut token: Option<String> = None;

        for page in 1..=max_pages {
            if page > 1 && !self.policy.page_token_delay.is_zero() {
                tokio::time::sleep(self.policy.page_token_delay).await;
            }

            let query = LookupQuery {
                center: task.center,
                radius_m: task.radius_m,
                term,
                page_token: token.as_deref(),
            };
            let result = retry_with_backoff(
                self.policy.max_retries,
                self.policy.retry_backoff_base,
                || self.lookup.lookup(query),
            )
            .await;

            match result {
                Ok(lookup_page) => {
                    tracing::debug!(
                        task = task.index,
                        page,
                        results = lookup_page.results.len(),
                        "fetched page"
                    );
                    records.extend(lookup_page.results);
                    token = lookup_page.next_page_token;
                    if token.is_none() {
                        return SubTaskOutcome::Success(records);
                    }
                }
                Err(err) => {
                    let error = SubTaskError::from_places(&err, page);
                    return match error.kind {
                        FailureKind::Transient => SubTaskOutcome::PartialFailure { records, error },
                        FailureKind::Fatal => SubTaskOutcome::FatalFailure(error),
                    };
                }
            }
        }

        tracing::debug!(
            task = task.index,
            max_pages,
            "page cap reached with more results available"
        );
        SubTaskOutcome::Success(records)
    }
}
