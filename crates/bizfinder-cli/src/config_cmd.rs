//! `bizfinder config`: persist settings to the YAML config file and show
//! the effective configuration.

use std::path::{Path, PathBuf};

use anyhow::bail;
use bizfinder_core::{default_config_dir, save_file_config, AppConfig, FileConfig};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct ConfigArgs {
    /// Store a Google API key
    #[arg(long)]
    pub(crate) set_api_key: Option<String>,
    /// Store the default sub-search radius in meters
    #[arg(long)]
    pub(crate) set_sub_radius: Option<f64>,
    /// Store the default number of concurrent sub-searches
    #[arg(long)]
    pub(crate) set_max_workers: Option<usize>,
    /// Print the effective configuration
    #[arg(long)]
    pub(crate) show: bool,
}

impl ConfigArgs {
    fn has_updates(&self) -> bool {
        self.set_api_key.is_some()
            || self.set_sub_radius.is_some()
            || self.set_max_workers.is_some()
    }
}

pub(crate) fn run_config(config: &AppConfig, args: &ConfigArgs) -> anyhow::Result<()> {
    if args.has_updates() {
        let path = target_path(config)?;
        apply_updates(&path, args)?;
        println!("Configuration saved to {}", path.display());
        if args.show {
            // Re-read so the printout reflects what was just written.
            show(&bizfinder_core::load_app_config_from_env()?);
        }
    } else {
        show(config);
    }
    Ok(())
}

/// The YAML file updates go to: the file currently in use when it is YAML,
/// otherwise `~/.business_finder/config.yaml`.
fn target_path(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let in_use_yaml = config.config_path.as_ref().filter(|p| {
        p.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
    });
    match in_use_yaml {
        Some(path) => Ok(path.clone()),
        None => Ok(default_config_dir()?.join("config.yaml")),
    }
}

pub(crate) fn apply_updates(path: &Path, args: &ConfigArgs) -> anyhow::Result<FileConfig> {
    if let Some(sub_radius) = args.set_sub_radius {
        if !(sub_radius.is_finite() && sub_radius > 0.0) {
            bail!("sub-radius must be a positive number of meters, got {sub_radius}");
        }
    }
    if args.set_max_workers == Some(0) {
        bail!("max-workers must be at least 1");
    }

    let saved = save_file_config(path, |file| {
        if let Some(key) = &args.set_api_key {
            file.set_api_key(key.trim());
        }
        if let Some(sub_radius) = args.set_sub_radius {
            file.set_sub_radius(sub_radius);
        }
        if let Some(max_workers) = args.set_max_workers {
            file.set_max_workers(max_workers);
        }
    })?;
    Ok(saved)
}

fn show(config: &AppConfig) {
    let source = config
        .config_path
        .as_ref()
        .map_or_else(|| "(none, using defaults)".to_owned(), |p| p.display().to_string());
    let api_key = if config.google_api_key.is_some() {
        "[set]"
    } else {
        "[not set]"
    };

    println!("Config file:        {source}");
    println!("API key:            {api_key}");
    println!("Sub-radius:         {} m", config.sub_radius_m);
    println!("Max workers:        {}", config.max_workers);
    println!("Max radius:         {} m", config.max_radius_m);
    println!("Max pages:          {}", config.max_pages);
    println!("Page token delay:   {} ms", config.page_token_delay_ms);
    println!("Max retries:        {}", config.max_retries);
    println!("Fetch details:      {}", config.fetch_details);
    println!("Results directory:  {}", config.results_dir.display());
}
