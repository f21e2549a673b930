mod config_cmd;
mod export;
mod params;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config_cmd::ConfigArgs;
use crate::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "bizfinder")]
#[command(about = "Find businesses around a point, splitting large areas into a search grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for businesses and export the results
    Search(SearchArgs),
    /// Show or update the saved configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Search progress is printed from the event stream, so the tracing
    // mirror stays at warn unless RUST_LOG asks for more.
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = bizfinder_core::load_app_config_from_env()?;

    match cli.command {
        Commands::Search(args) => search::run_search(&config, args).await?,
        Commands::Config(args) => config_cmd::run_config(&config, &args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
