//! API endpoints for the dashboard backend

use axum::{routing::get, Router};
use std::sync::Arc;

mod settings;
mod system;

use crate::checks::DiagnosticsContext;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub diagnostics: Arc<DiagnosticsContext>,
}

impl AppState {
    pub fn new(diagnostics: Arc<DiagnosticsContext>) -> Self {
        Self { diagnostics }
    }
}

/// Create the API router with all endpoints
pub fn router(diagnostics: Arc<DiagnosticsContext>) -> Router {
    let app_state = AppState::new(diagnostics);

    Router::new()
        // Preflight diagnostics
        .route("/preflight", get(system::get_preflight))
        .route("/preflight/report", get(system::get_preflight_report))
        .route("/load-check", get(system::get_load_check))
        // API key settings
        .route(
            "/settings/key",
            get(settings::get_api_key).post(settings::set_api_key),
        )
        .with_state(app_state)
}
