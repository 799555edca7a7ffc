mod config;
mod metrics;
mod routes;
mod store;

use anyhow::{Context, Result};
use config::AppConfig;
use export::Exporter;
use extract::ExtractionClient;
use metrics::Metrics;
use routes::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use store::ExtractionStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let store = ExtractionStore::new();
    match store.load_dir(&config.server.data_dir).await {
        Ok(count) => info!(
            count,
            data_dir = %config.server.data_dir.display(),
            "Loaded stored extractions"
        ),
        Err(e) => warn!(error = %e, "No stored extractions loaded"),
    }

    let backend = config.backend.base_url.as_ref().map(|url| {
        info!(base_url = %url, "Using extraction backend");
        ExtractionClient::new(url.clone(), config.retry.policy())
    });

    let state = Arc::new(AppState {
        store,
        exporter: Exporter::default().with_json_view(config.export.json_view),
        backend,
        metrics: Metrics::new(),
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(addr = %config.server.bind_addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
