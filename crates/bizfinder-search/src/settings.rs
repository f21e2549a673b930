use std::time::Duration;

use bizfinder_core::config::{
    DEFAULT_MAX_SUB_TASKS, DEFAULT_MAX_WORKERS, DEFAULT_SUB_RADIUS_M, UPSTREAM_MAX_RADIUS_M,
};
use bizfinder_core::AppConfig;

/// How one sub-task walks the upstream's pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPolicy {
    /// Upper bound on pages per sub-task. Reaching it is not an error.
    pub max_pages: usize,
    /// Pause before requesting a continuation page. Continuation tokens are
    /// not usable immediately after they are issued.
    pub page_token_delay: Duration,
    /// Extra attempts after the first on a transient error.
    pub max_retries: u32,
    pub retry_backoff_base: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_token_delay: Duration::from_millis(2_000),
            max_retries: 3,
            retry_backoff_base: Duration::from_millis(1_000),
        }
    }
}

impl FetchPolicy {
    /// No pauses at all. Used by tests and by fakes that answer instantly.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            page_token_delay: Duration::ZERO,
            retry_backoff_base: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Search-wide defaults; per-request overrides win over these.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub default_sub_radius_m: f64,
    pub default_max_workers: usize,
    pub max_radius_m: f64,
    /// Requests whose grid would need more sub-searches than this are
    /// rejected before any upstream call.
    pub max_sub_tasks: usize,
    pub fetch: FetchPolicy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_sub_radius_m: DEFAULT_SUB_RADIUS_M,
            default_max_workers: DEFAULT_MAX_WORKERS,
            max_radius_m: UPSTREAM_MAX_RADIUS_M,
            max_sub_tasks: DEFAULT_MAX_SUB_TASKS,
            fetch: FetchPolicy::default(),
        }
    }
}

impl SearchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            default_sub_radius_m: config.sub_radius_m,
            default_max_workers: config.max_workers.max(1),
            max_radius_m: config.max_radius_m,
            max_sub_tasks: config.max_sub_tasks.max(1),
            fetch: FetchPolicy {
                max_pages: config.max_pages.max(1),
                page_token_delay: Duration::from_millis(config.page_token_delay_ms),
                max_retries: config.max_retries,
                retry_backoff_base: Duration::from_millis(config.retry_backoff_base_ms),
            },
        }
    }
}
