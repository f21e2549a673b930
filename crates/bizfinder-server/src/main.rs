mod api;
mod middleware;

use std::sync::Arc;

use bizfinder_places::PlacesClient;
use bizfinder_search::{SearchOrchestrator, SearchSettings};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = bizfinder_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(config = ?config, "loaded configuration");

    let search = match config.google_api_key.as_deref() {
        Some(key) => {
            let client = PlacesClient::new(key, config.request_timeout_secs, &config.user_agent)?
                .with_details(config.fetch_details, config.details_delay_ms);
            Some(Arc::new(SearchOrchestrator::new(
                Arc::new(client),
                SearchSettings::from_app_config(&config),
            )))
        }
        None => {
            tracing::warn!("GOOGLE_API_KEY is not set; search requests will return 503");
            None
        }
    };

    let app = build_app(AppState {
        search,
        results_dir: Arc::new(config.results_dir.clone()),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
