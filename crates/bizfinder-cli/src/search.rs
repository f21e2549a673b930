//! `bizfinder search`: resolve parameters, run the grid search with live
//! progress, and export the results.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use bizfinder_core::{AppConfig, Coordinates};
use bizfinder_places::PlacesClient;
use bizfinder_search::{
    EventLevel, EventLog, SearchLogEvent, SearchOrchestrator, SearchRequest, SearchResult,
    SearchSettings,
};
use clap::Args;

use crate::export::{export, ExportFormat};
use crate::params::SearchParams;

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// Latitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) latitude: Option<f64>,
    /// Longitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) longitude: Option<f64>,
    /// Address or place name, geocoded when no coordinates are given
    #[arg(long)]
    pub(crate) location: Option<String>,
    /// Search radius in meters
    #[arg(long, default_value_t = 1000.0)]
    pub(crate) radius: f64,
    #[arg(long, default_value = "business")]
    pub(crate) search_term: String,
    /// Radius of each grid cell in meters (defaults to the configured value)
    #[arg(long)]
    pub(crate) sub_radius: Option<f64>,
    /// Concurrent sub-searches (defaults to the configured value)
    #[arg(long)]
    pub(crate) max_workers: Option<usize>,
    /// Output file (default: business_results.csv or .json)
    #[arg(long, short)]
    pub(crate) output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub(crate) format: ExportFormat,
    /// Search parameters as a JSON object; overrides the flags above
    #[arg(long)]
    pub(crate) json_params: Option<String>,
    /// Path to a JSON file of search parameters, applied after --json-params
    #[arg(long)]
    pub(crate) params_file: Option<PathBuf>,
    /// Google API key (overrides the configured key)
    #[arg(long)]
    pub(crate) api_key: Option<String>,
    /// Only print the final summary
    #[arg(long, short)]
    pub(crate) quiet: bool,
}

/// Fold `--json-params` then `--params-file` into the flag values.
pub(crate) fn apply_params(args: &mut SearchArgs) -> anyhow::Result<()> {
    if let Some(raw) = args.json_params.take() {
        SearchParams::parse_json(&raw)?.apply_to(args);
    }
    if let Some(path) = args.params_file.take() {
        SearchParams::from_file(&path)?.apply_to(args);
    }
    Ok(())
}

pub(crate) async fn run_search(config: &AppConfig, mut args: SearchArgs) -> anyhow::Result<()> {
    apply_params(&mut args)?;

    let api_key = args
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| config.google_api_key.clone())
        .ok_or_else(|| {
            anyhow!("no Google API key; set GOOGLE_API_KEY or run `bizfinder config --set-api-key <KEY>`")
        })?;

    let client = Arc::new(
        PlacesClient::new(&api_key, config.request_timeout_secs, &config.user_agent)?
            .with_details(config.fetch_details, config.details_delay_ms),
    );
    let center = resolve_center(&client, &args).await?;

    let request = SearchRequest::new(args.search_term.clone(), center, args.radius)
        .with_sub_radius(args.sub_radius)
        .with_max_workers(args.max_workers);
    tracing::debug!(?request, "built search request");
    let orchestrator = SearchOrchestrator::new(client, SearchSettings::from_app_config(config));

    let log = EventLog::new();
    let printer = (!args.quiet).then(|| {
        let mut events = log.subscribe();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
        })
    });

    let result = orchestrator.search_with_log(&request, &log).await;
    if let Some(printer) = printer {
        // The stream ends when the search closes the log.
        printer.await.ok();
    }
    let result = result?;

    print_summary(&result);

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(args.format.default_file_name()));
    if export(&output, args.format, &result.records)? {
        println!("Results saved to {}", output.display());
    } else {
        println!("No businesses found; nothing written.");
    }
    Ok(())
}

async fn resolve_center(client: &PlacesClient, args: &SearchArgs) -> anyhow::Result<Coordinates> {
    match (args.latitude, args.longitude, args.location.as_deref()) {
        (Some(latitude), Some(longitude), _) => Ok(Coordinates::new(latitude, longitude)),
        (None, None, Some(location)) => {
            let found = client.geocode(location).await?;
            if !args.quiet {
                println!(
                    "Found location: {} ({}, {})",
                    found.formatted_address,
                    found.coordinates.latitude,
                    found.coordinates.longitude
                );
            }
            Ok(found.coordinates)
        }
        (Some(_), None, _) | (None, Some(_), _) => {
            bail!("--latitude and --longitude must be given together")
        }
        (None, None, None) => {
            bail!("provide --latitude and --longitude, or --location")
        }
    }
}

fn print_event(event: &SearchLogEvent) {
    if event.level == EventLevel::Debug {
        return;
    }
    let line = format!(
        "{} [{}] {}: {}",
        event.timestamp.format("%H:%M:%S"),
        event.level,
        event.category,
        event.message
    );
    if matches!(event.level, EventLevel::Warning | EventLevel::Error) {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn print_summary(result: &SearchResult) {
    let stats = &result.stats;
    println!(
        "Found {} unique businesses ({} raw, {} duplicates removed) from {} sub-searches in {} ms",
        stats.final_count,
        stats.raw_count,
        stats.duplicates_removed,
        stats.sub_task_count,
        stats.duration_ms
    );
    if result.is_partial() {
        eprintln!(
            "Warning: {} of {} sub-searches did not complete; results may be missing some areas",
            result.failures.len(),
            stats.sub_task_count
        );
    }
}
