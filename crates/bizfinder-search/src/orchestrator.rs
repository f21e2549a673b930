//! End-to-end search: validate, partition, execute, merge, report.

use std::sync::Arc;
use std::time::Instant;

use bizfinder_core::{BusinessRecord, Coordinates};
use bizfinder_places::PlaceLookup;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::SearchError;
use crate::events::{EventCategory, EventLevel, EventLog, SearchLogEvent};
use crate::executor::{self, millis, OutcomeCounts, TaskReport};
use crate::fetcher::{PageFetcher, SubTaskError};
use crate::grid;
use crate::merge::merge_reports;
use crate::request::{ResolvedRequest, SearchRequest, SubSearchTask};
use crate::settings::SearchSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub raw_count: usize,
    pub final_count: usize,
    pub duplicates_removed: usize,
    pub fields_filled: usize,
    pub sub_task_count: usize,
    pub succeeded_sub_tasks: usize,
    pub partial_sub_tasks: usize,
    pub failed_sub_tasks: usize,
    /// `false` when the request fit in a single upstream call.
    pub grid_used: bool,
    pub duration_ms: u64,
}

/// A sub-disc whose results are missing or incomplete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTaskFailure {
    pub index: usize,
    pub center: Coordinates,
    pub radius_m: f64,
    pub records_kept: usize,
    pub error: SubTaskError,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub request_id: Uuid,
    pub records: Vec<BusinessRecord>,
    pub stats: SearchStats,
    /// Sorted by sub-task index. Empty when every sub-search completed.
    pub failures: Vec<SubTaskFailure>,
    pub events: Vec<SearchLogEvent>,
}

impl SearchResult {
    /// `true` when some area of the request may be missing from `records`.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs whole searches against one places capability.
///
/// Holds no per-search state, so one orchestrator can serve concurrent
/// searches.
#[derive(Clone)]
pub struct SearchOrchestrator {
    fetcher: PageFetcher,
    settings: SearchSettings,
}

impl SearchOrchestrator {
    #[must_use]
    pub fn new(lookup: Arc<dyn PlaceLookup>, settings: SearchSettings) -> Self {
        Self {
            fetcher: PageFetcher::new(lookup, settings.fetch),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run `request` with a private event log.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidParameter`] before any upstream call
    /// if the request does not validate. Upstream failures never surface
    /// here; they are reported through [`SearchResult::failures`].
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        self.search_with_log(request, &EventLog::new()).await
    }

    /// Run `request`, recording progress into `log`.
    ///
    /// Subscribers of `log` see each event as it happens; their streams end
    /// when this returns.
    ///
    /// # Errors
    ///
    /// Same as [`SearchOrchestrator::search`].
    pub async fn search_with_log(
        &self,
        request: &SearchRequest,
        log: &EventLog,
    ) -> Result<SearchResult, SearchError> {
        let result = match request.resolve(&self.settings) {
            Ok(resolved) => Ok(self.execute(request, resolved, log).await),
            Err(e) => {
                tracing::warn!(request_id = %request.id(), error = %e, "rejected search request");
                Err(e)
            }
        };
        log.close();
        result
    }

    async fn execute(
        &self,
        request: &SearchRequest,
        resolved: ResolvedRequest,
        log: &EventLog,
    ) -> SearchResult {
        let started = Instant::now();
        let term = request.search_term();
        let center = request.center();
        let radius_m = request.radius_m();

        log.record(
            EventLevel::Info,
            EventCategory::Search,
            format!(
                "Starting search for '{term}' within {radius_m:.0}m of ({:.6}, {:.6})",
                center.latitude, center.longitude
            ),
            Some(json!({
                "request_id": request.id(),
                "search_term": term,
                "center": center,
                "radius_m": radius_m,
                "sub_radius_m": resolved.sub_radius_m,
                "max_workers": resolved.max_workers,
            })),
        );

        let grid_used = radius_m > resolved.sub_radius_m;
        let reports = if grid_used {
            self.run_grid(request, resolved, log).await
        } else {
            let task = SubSearchTask {
                index: 0,
                center,
                radius_m,
                request_id: request.id(),
            };
            vec![executor::execute_task(&self.fetcher, &task, term, 1, log).await]
        };

        let merged = merge_reports(&reports);
        let counts = OutcomeCounts::tally(&reports);
        log.record(
            EventLevel::Info,
            EventCategory::DedupStats,
            format!(
                "Removed {} duplicate businesses ({} raw, {} unique)",
                merged.stats.duplicates_removed, merged.stats.raw_count, merged.stats.final_count
            ),
            Some(json!(merged.stats)),
        );
        log.info(
            EventCategory::Search,
            format!(
                "Total unique businesses found: {}",
                merged.stats.final_count
            ),
        );

        let failures = collect_failures(&reports);
        report_failures(&failures, reports.len(), counts, log);

        let duration_ms = millis(started.elapsed());
        log.record(
            EventLevel::Info,
            EventCategory::Performance,
            format!("Search completed in {duration_ms} ms"),
            Some(json!({ "duration_ms": duration_ms, "sub_tasks": reports.len() })),
        );

        SearchResult {
            request_id: request.id(),
            records: merged.records,
            stats: SearchStats {
                raw_count: merged.stats.raw_count,
                final_count: merged.stats.final_count,
                duplicates_removed: merged.stats.duplicates_removed,
                fields_filled: merged.stats.fields_filled,
                sub_task_count: reports.len(),
                succeeded_sub_tasks: counts.succeeded,
                partial_sub_tasks: counts.partial,
                failed_sub_tasks: counts.failed,
                grid_used,
                duration_ms,
            },
            failures,
            events: log.snapshot(),
        }
    }

    async fn run_grid(
        &self,
        request: &SearchRequest,
        resolved: ResolvedRequest,
        log: &EventLog,
    ) -> Vec<TaskReport> {
        let tasks = match grid::partition(
            request.center(),
            request.radius_m(),
            resolved.sub_radius_m,
            request.id(),
        ) {
            Ok(tasks) => tasks,
            // Unreachable after `resolve`, which checks the same bounds.
            Err(e) => {
                log.error(
                    EventCategory::GridGeneration,
                    format!("Grid generation failed: {e}"),
                );
                return Vec::new();
            }
        };

        log.record(
            EventLevel::Info,
            EventCategory::GridGeneration,
            format!(
                "Breaking search into {} sub-searches with radius {:.0}m",
                tasks.len(),
                resolved.sub_radius_m
            ),
            Some(json!({
                "sub_task_count": tasks.len(),
                "sub_radius_m": resolved.sub_radius_m,
                "centers": tasks.iter().map(|t| t.center).collect::<Vec<_>>(),
            })),
        );

        executor::run(
            &self.fetcher,
            &tasks,
            request.search_term(),
            resolved.max_workers,
            log,
        )
        .await
    }
}

fn collect_failures(reports: &[TaskReport]) -> Vec<SubTaskFailure> {
    let mut failures: Vec<SubTaskFailure> = reports
        .iter()
        .filter_map(|report| {
            report.outcome.error().map(|error| SubTaskFailure {
                index: report.task.index,
                center: report.task.center,
                radius_m: report.task.radius_m,
                records_kept: report.outcome.records().len(),
                error: error.clone(),
            })
        })
        .collect();
    failures.sort_by_key(|f| f.index);
    failures
}

fn report_failures(
    failures: &[SubTaskFailure],
    total: usize,
    counts: OutcomeCounts,
    log: &EventLog,
) {
    let Some(first) = failures.first() else {
        return;
    };
    let payload = json!({
        "failed": counts.failed,
        "partial": counts.partial,
        "sub_tasks": total,
        "failures": failures,
    });

    if counts.succeeded == 0 && counts.partial == 0 {
        log.record(
            EventLevel::Error,
            EventCategory::Search,
            format!(
                "All {total} sub-searches failed; no results could be retrieved: {}",
                first.error.message
            ),
            Some(payload),
        );
    } else {
        log.record(
            EventLevel::Warning,
            EventCategory::Search,
            format!(
                "Partial results: {} of {total} sub-searches did not complete ({} failed, {} partial); some areas may be missing",
                failures.len(),
                counts.failed,
                counts.partial
            ),
            Some(payload),
        );
    }
}
