//! Bounded-concurrency execution of sub-tasks.
//!
//! At most `max_workers` sub-tasks are in flight at once. One sub-task's
//! failure never cancels or delays the others; it only shows up in its own
//! [`TaskReport`].

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde_json::json;

use crate::events::{EventCategory, EventLevel, EventLog};
use crate::fetcher::{PageFetcher, SubTaskOutcome};
use crate::request::SubSearchTask;

/// What happened to one sub-task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: SubSearchTask,
    pub outcome: SubTaskOutcome,
    pub duration: Duration,
}

/// Totals across a batch of reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub raw_records: usize,
}

impl OutcomeCounts {
    #[must_use]
    pub fn tally(reports: &[TaskReport]) -> Self {
        reports.iter().fold(Self::default(), |mut counts, report| {
            match report.outcome {
                SubTaskOutcome::Success(_) => counts.succeeded += 1,
                SubTaskOutcome::PartialFailure { .. } => counts.partial += 1,
                SubTaskOutcome::FatalFailure(_) => counts.failed += 1,
            }
            counts.raw_records += report.outcome.records().len();
            counts
        })
    }
}

/// Run every task with at most `max_workers` in flight.
///
/// Reports come back in completion order, one per task. Start and
/// completion of each task, plus a closing summary, are recorded in `log`.
pub async fn run(
    fetcher: &PageFetcher,
    tasks: &[SubSearchTask],
    term: &str,
    max_workers: usize,
    log: &EventLog,
) -> Vec<TaskReport> {
    let started = Instant::now();
    let total = tasks.len();

    let reports: Vec<TaskReport> = stream::iter(0..total)
        .map(|i| execute_task(fetcher, &tasks[i], term, total, log))
        .buffer_unordered(max_workers.max(1))
        .collect()
        .await;

    let counts = OutcomeCounts::tally(&reports);
    let elapsed_ms = millis(started.elapsed());
    log.record(
        EventLevel::Info,
        EventCategory::Performance,
        format!(
            "Completed {total} sub-searches in {elapsed_ms} ms: {} succeeded, {} partial, {} failed",
            counts.succeeded, counts.partial, counts.failed
        ),
        Some(json!({
            "sub_tasks": total,
            "succeeded": counts.succeeded,
            "partial": counts.partial,
            "failed": counts.failed,
            "raw_records": counts.raw_records,
            "max_workers": max_workers,
            "duration_ms": elapsed_ms,
        })),
    );

    reports
}

/// Run one task to completion and record its start and end.
pub(crate) async fn execute_task(
    fetcher: &PageFetcher,
    task: &SubSearchTask,
    term: &str,
    total: usize,
    log: &EventLog,
) -> TaskReport {
    let position = task.index + 1;
    log.record(
        EventLevel::Debug,
        EventCategory::SubSearchProgress,
        format!(
            "Starting sub-search {position}/{total} at ({:.6}, {:.6}) with radius {:.0}m",
            task.center.latitude, task.center.longitude, task.radius_m
        ),
        Some(json!({
            "index": task.index,
            "center": task.center,
            "radius_m": task.radius_m,
        })),
    );

    let started = Instant::now();
    let outcome = fetcher.fetch_all(task, term).await;
    let duration = started.elapsed();
    let duration_ms = millis(duration);
    let found = outcome.records().len();

    let payload = json!({
        "index": task.index,
        "outcome": outcome.label(),
        "results": found,
        "duration_ms": duration_ms,
        "error": outcome.error(),
    });
    match outcome.error() {
        None => log.record(
            EventLevel::Info,
            EventCategory::SubSearchProgress,
            format!("Sub-search {position}/{total} found {found} businesses in {duration_ms} ms"),
            Some(payload),
        ),
        Some(error) => log.record(
            EventLevel::Warning,
            EventCategory::SubSearchProgress,
            format!(
                "Sub-search {position}/{total} {} after {duration_ms} ms with {found} businesses: {}",
                if found > 0 { "partially failed" } else { "failed" },
                error.message
            ),
            Some(payload),
        ),
    }

    TaskReport {
        task: *task,
        outcome,
        duration,
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
