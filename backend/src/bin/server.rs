//! Attractions HTTP Server Binary
//!
//! This is the main entry point for the attractions REST API server.
//! It loads configuration, connects and seeds the store, sets up the HTTP
//! router and serves until Ctrl-C, then closes the store.
//!
//! # Usage
//!
//! ```bash
//! DATA_PATH=data/attractions.json cargo run --bin attractions-server
//! ```
//!
//! # Environment Variables
//!
//! - `ATTRACTIONS_CONFIG`: Path to the TOML configuration file
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DATA_PATH`: JSON export loaded at startup
//! - `GEO_INDEX`: Declare a geospatial index (default: false)
//! - `NEARBY_CANDIDATE_CAP`: Fallback nearby candidate ceiling (default: 5000)
//! - `RUST_LOG`: Log filter (default: info)

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use attractions_backend::config::AppConfig;
use attractions_backend::db::RepositoryFactory;
use attractions_backend::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Attractions HTTP Server");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let repository = RepositoryFactory::from_config(&config)
        .await
        .context("Failed to initialize the attraction store")?;
    info!("Repository initialized successfully");

    let state = AppState::with_settings(repository.clone(), config.query_settings());
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repository
        .close()
        .await
        .context("Failed to close the attraction store")?;
    info!("Store closed, server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
