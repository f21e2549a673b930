use bizfinder_core::Coordinates;
use bizfinder_places::client::MAX_CALL_RADIUS_M;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SearchError;
use crate::grid;
use crate::settings::SearchSettings;

/// A caller's search: a term, a center, and the radius to cover.
///
/// Built once through [`SearchRequest::new`] and the `with_*` builders; there
/// are no setters. Overrides left as `None` fall back to [`SearchSettings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    id: Uuid,
    search_term: String,
    center: Coordinates,
    radius_m: f64,
    sub_radius_m: Option<f64>,
    max_workers: Option<usize>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(search_term: impl Into<String>, center: Coordinates, radius_m: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            search_term: search_term.into(),
            center,
            radius_m,
            sub_radius_m: None,
            max_workers: None,
        }
    }

    #[must_use]
    pub fn with_sub_radius(mut self, sub_radius_m: Option<f64>) -> Self {
        self.sub_radius_m = sub_radius_m;
        self
    }

    #[must_use]
    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub fn center(&self) -> Coordinates {
        self.center
    }

    #[must_use]
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    #[must_use]
    pub fn sub_radius_m(&self) -> Option<f64> {
        self.sub_radius_m
    }

    #[must_use]
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Checks every field and resolves the overrides against `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidParameter`] naming the first offending
    /// field.
    pub fn resolve(&self, settings: &SearchSettings) -> Result<ResolvedRequest, SearchError> {
        if self.search_term.trim().is_empty() {
            return Err(SearchError::invalid("search_term", "must not be empty"));
        }
        if !self.center.is_valid() {
            return Err(SearchError::invalid(
                "center",
                format!(
                    "latitude must be within [-90, 90] and longitude within [-180, 180], got {}",
                    self.center
                ),
            ));
        }
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(SearchError::invalid(
                "radius",
                format!("must be a positive number of meters, got {}", self.radius_m),
            ));
        }
        if self.radius_m > settings.max_radius_m {
            return Err(SearchError::invalid(
                "radius",
                format!(
                    "{} m exceeds the configured maximum of {} m",
                    self.radius_m, settings.max_radius_m
                ),
            ));
        }

        let sub_radius_m = self.sub_radius_m.unwrap_or(settings.default_sub_radius_m);
        if !(sub_radius_m.is_finite() && sub_radius_m > 0.0) {
            return Err(SearchError::invalid(
                "sub_radius",
                format!("must be a positive number of meters, got {sub_radius_m}"),
            ));
        }
        if sub_radius_m > MAX_CALL_RADIUS_M {
            return Err(SearchError::invalid(
                "sub_radius",
                format!("{sub_radius_m} m exceeds the per-call limit of {MAX_CALL_RADIUS_M} m"),
            ));
        }

        let planned = grid::estimated_task_count(self.radius_m, sub_radius_m);
        if planned > settings.max_sub_tasks {
            return Err(SearchError::invalid(
                "sub_radius",
                format!(
                    "{sub_radius_m} m would split a {} m search into about {planned} sub-searches, more than the limit of {}",
                    self.radius_m, settings.max_sub_tasks
                ),
            ));
        }

        let max_workers = self.max_workers.unwrap_or(settings.default_max_workers);
        if max_workers == 0 {
            return Err(SearchError::invalid("max_workers", "must be at least 1"));
        }

        Ok(ResolvedRequest {
            sub_radius_m,
            max_workers,
        })
    }
}

/// The effective tuning of one validated request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRequest {
    /// Largest radius served by one upstream call for this request.
    pub sub_radius_m: f64,
    pub max_workers: usize,
}

/// One unit of upstream work: a sub-disc searched with its own pagination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubSearchTask {
    /// Position in generation order; merge order follows it.
    pub index: usize,
    pub center: Coordinates,
    pub radius_m: f64,
    pub request_id: Uuid,
}
