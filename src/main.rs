//! Headscale Dashboard Backend
//!
//! HTTP API server running preflight checks and API key management for a
//! headscale web dashboard.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headscale_dashboard_backend::api;
use headscale_dashboard_backend::checks::{
    DiagnosticsContext, LoadOutcome, PreflightPaths, SystemProbe,
};
use headscale_dashboard_backend::config::Config;
use headscale_dashboard_backend::headscale::{HttpHeadscaleClient, KeyStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Headscale server: {}", config.headscale_url);

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let paths = PreflightPaths::default();
    let key_store = KeyStore::new(paths.key_file.clone());
    let headscale = HttpHeadscaleClient::from_config(&config, http.clone(), key_store);

    let diagnostics = Arc::new(DiagnosticsContext::new(
        Arc::new(headscale),
        http,
        Arc::new(SystemProbe),
        paths,
    ));

    // Startup pass so misconfiguration shows up in the logs right away
    match diagnostics.load_checks().await {
        LoadOutcome::Pass => tracing::info!("Startup checks passed, API key is valid"),
        LoadOutcome::SettingsPage => {
            tracing::warn!("No valid API key yet - dashboard will show the settings page")
        }
        LoadOutcome::ErrorPage { .. } => {
            tracing::warn!("Startup checks failed - dashboard will show the error page")
        }
    }

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::router(diagnostics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    tracing::info!("Starting server on {}", config.bind_addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health               - Health check");
    tracing::info!("  GET  /api/preflight        - Run preflight checks");
    tracing::info!("  GET  /api/preflight/report - Preflight error fragments (HTML)");
    tracing::info!("  GET  /api/load-check       - Page routing hint");
    tracing::info!("  GET  /api/settings/key     - Stored API key status");
    tracing::info!("  POST /api/settings/key     - Test and store a new API key");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
