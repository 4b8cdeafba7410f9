// API Server Binary Entry Point
//
// Purpose: Start the Axum API server over the SSURGO extract and the crop catalogue
// Usage: cargo run --features api --bin api_server

use soil_quality_rust::api_server::DEFAULT_EXTERNAL_TIMEOUT;
use soil_quality_rust::{create_router, AppState, CatalogueHandle, SoilQualityEvaluator, SsurgoExtract};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "soil_quality_rust=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    // DATA_DIR holds both the requirement CSVs and the SSURGO extract
    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let timeout = std::env::var("EXTERNAL_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(DEFAULT_EXTERNAL_TIMEOUT);

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {}", data_dir.display());
    tracing::info!("  PORT: {}", port);
    tracing::info!("  EXTERNAL_TIMEOUT_SECS: {:.1}", timeout.as_secs_f64());

    tracing::info!("Loading crop requirement catalogue...");
    let catalogue = Arc::new(CatalogueHandle::load_dir(&data_dir)?);

    tracing::info!("Loading SSURGO extract...");
    let extract = SsurgoExtract::load_dir(&data_dir)?;
    tracing::info!("Loaded {} SSURGO horizons", extract.horizon_count());

    let state = AppState::new(SoilQualityEvaluator::new(catalogue), Arc::new(extract), timeout);
    tracing::info!("Application state initialized successfully");

    // Create router with all endpoints and middleware
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
