use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub google_api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub results_dir: PathBuf,
    /// The file the values below were read from, if any.
    pub config_path: Option<PathBuf>,
    pub sub_radius_m: f64,
    pub max_workers: usize,
    pub max_radius_m: f64,
    pub max_sub_tasks: usize,
    pub max_pages: usize,
    pub page_token_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub fetch_details: bool,
    pub details_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("results_dir", &self.results_dir)
            .field("config_path", &self.config_path)
            .field("sub_radius_m", &self.sub_radius_m)
            .field("max_workers", &self.max_workers)
            .field("max_radius_m", &self.max_radius_m)
            .field("max_sub_tasks", &self.max_sub_tasks)
            .field("max_pages", &self.max_pages)
            .field("page_token_delay_ms", &self.page_token_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("fetch_details", &self.fetch_details)
            .field("details_delay_ms", &self.details_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
