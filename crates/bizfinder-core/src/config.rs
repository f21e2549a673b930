use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::app_config::AppConfig;
use crate::file_config::{load_file_config, FileConfig};
use crate::ConfigError;

pub const DEFAULT_SUB_RADIUS_M: f64 = 3_000.0;
pub const DEFAULT_MAX_WORKERS: usize = 4;
/// Most sub-searches one request may fan out into.
pub const DEFAULT_MAX_SUB_TASKS: usize = 1_000;
/// Largest radius the upstream accepts for a single call, and the largest
/// radius a request may ask for.
pub const UPSTREAM_MAX_RADIUS_M: f64 = 50_000.0;

const CONFIG_DIR_NAME: &str = ".business_finder";

/// Load application configuration from the environment and the first config
/// file found on the search path.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or a config file exists but
/// cannot be read or parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or a config file exists but
/// cannot be read or parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    let lookup = |key: &str| std::env::var(key);
    let config_path = resolve_config_path(&lookup, Path::exists);
    let file = match &config_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    build_app_config(lookup, &file, config_path)
}

/// `$HOME/.business_finder`, the directory `config --set-*` writes to.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] when `HOME` (or `USERPROFILE`) is unset.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    home_dir(&|key: &str| std::env::var(key))
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

fn home_dir<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("HOME")
        .or_else(|_| lookup("USERPROFILE"))
        .ok()
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Pick the config file to read.
///
/// An explicit `BUSINESS_FINDER_CONFIG` wins even if the file is missing, so
/// a typo surfaces as a read error instead of silently using defaults.
/// Otherwise the first existing candidate of `./business_finder.yaml`,
/// `~/.business_finder/config.yaml`, `~/.business_finder/config.json` is used.
fn resolve_config_path<F, E>(lookup: &F, exists: E) -> Option<PathBuf>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    E: Fn(&Path) -> bool,
{
    if let Ok(explicit) = lookup("BUSINESS_FINDER_CONFIG") {
        if !explicit.trim().is_empty() {
            return Some(PathBuf::from(explicit));
        }
    }

    let mut candidates = vec![PathBuf::from("business_finder.yaml")];
    if let Some(home) = home_dir(lookup) {
        let dir = home.join(CONFIG_DIR_NAME);
        candidates.push(dir.join("config.yaml"));
        candidates.push(dir.join("config.json"));
    }

    candidates.into_iter().find(|p| exists(p))
}

/// Build application configuration from an env-var lookup and a parsed file.
///
/// Each value resolves env var > file > default. Decoupled from the real
/// environment so it can be tested with a `HashMap` lookup.
fn build_app_config<F>(
    lookup: F,
    file: &FileConfig,
    config_path: Option<PathBuf>,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env_value = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        env_value(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match env_value(var) {
            None => Ok(default),
            Some(raw) => {
                parse_flag(&raw).ok_or_else(|| invalid(var, format!("\"{raw}\" is not a boolean")))
            }
        }
    };

    let google_api_key = env_value("GOOGLE_API_KEY").or_else(|| file.api_key().map(str::to_owned));

    let sub_radius_m = match env_value("BUSINESS_FINDER_SUB_RADIUS") {
        Some(_) => parse_f64("BUSINESS_FINDER_SUB_RADIUS", "")?,
        None => file.sub_radius().unwrap_or(DEFAULT_SUB_RADIUS_M),
    };
    let max_workers = match env_value("BUSINESS_FINDER_MAX_WORKERS") {
        Some(_) => parse_usize("BUSINESS_FINDER_MAX_WORKERS", "")?,
        None => file.max_workers().unwrap_or(DEFAULT_MAX_WORKERS),
    };
    let max_radius_m = parse_f64("BUSINESS_FINDER_MAX_RADIUS", "50000")?;
    let max_sub_tasks = parse_usize(
        "BUSINESS_FINDER_MAX_SUB_TASKS",
        &DEFAULT_MAX_SUB_TASKS.to_string(),
    )?;

    require_positive("sub_radius", sub_radius_m)?;
    require_positive("max_radius", max_radius_m)?;
    if max_workers == 0 {
        return Err(ConfigError::InvalidValue {
            key: "max_workers".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if max_sub_tasks == 0 {
        return Err(ConfigError::InvalidValue {
            key: "max_sub_tasks".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let bind_addr = or_default("BUSINESS_FINDER_BIND_ADDR", "127.0.0.1:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("BUSINESS_FINDER_BIND_ADDR", e.to_string()))?;

    Ok(AppConfig {
        google_api_key,
        bind_addr,
        log_level: or_default("BUSINESS_FINDER_LOG_LEVEL", "info"),
        results_dir: PathBuf::from(or_default("BUSINESS_FINDER_RESULTS_DIR", "./data")),
        config_path,
        sub_radius_m,
        max_workers,
        max_radius_m,
        max_sub_tasks,
        max_pages: parse_usize("BUSINESS_FINDER_MAX_PAGES", "3")?,
        page_token_delay_ms: parse_u64("BUSINESS_FINDER_PAGE_TOKEN_DELAY_MS", "2000")?,
        max_retries: parse_u32("BUSINESS_FINDER_MAX_RETRIES", "3")?,
        retry_backoff_base_ms: parse_u64("BUSINESS_FINDER_RETRY_BACKOFF_BASE_MS", "1000")?,
        fetch_details: parse_bool("BUSINESS_FINDER_FETCH_DETAILS", true)?,
        details_delay_ms: parse_u64("BUSINESS_FINDER_DETAILS_DELAY_MS", "200")?,
        request_timeout_secs: parse_u64("BUSINESS_FINDER_REQUEST_TIMEOUT_SECS", "30")?,
        user_agent: or_default("BUSINESS_FINDER_USER_AGENT", "bizfinder/0.1 (places-search)"),
    })
}

fn require_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("must be a positive number of meters, got {value}"),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
