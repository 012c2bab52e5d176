//! System-level diagnostic endpoints.

use axum::{extract::State, response::Html, Json};
use serde::Serialize;

use crate::api::AppState;
use crate::checks::{CheckOutcome, LoadOutcome, LoadRoute, Verdict};

#[derive(Debug, Serialize)]
pub struct PreflightResponse {
    pub ok: bool,
    pub verdict: Verdict,
    pub checks: Vec<CheckOutcome>,
    pub report_html: String,
}

#[derive(Debug, Serialize)]
pub struct LoadCheckResponse {
    pub route: LoadRoute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_html: Option<String>,
}

/// GET /api/preflight - Run every preflight check and return the outcomes.
pub async fn get_preflight(State(state): State<AppState>) -> Json<PreflightResponse> {
    let report = state.diagnostics.run_checks().await;

    Json(PreflightResponse {
        ok: report.is_pass(),
        verdict: report.verdict(),
        checks: report.outcomes().to_vec(),
        report_html: report.into_html(),
    })
}

/// GET /api/preflight/report - Error fragments for the failed checks.
pub async fn get_preflight_report(State(state): State<AppState>) -> Html<String> {
    Html(state.diagnostics.run_checks().await.into_html())
}

/// GET /api/load-check - Which page the dashboard should show.
pub async fn get_load_check(State(state): State<AppState>) -> Json<LoadCheckResponse> {
    let outcome = state.diagnostics.load_checks().await;
    let route = outcome.route();
    let report_html = match outcome {
        LoadOutcome::ErrorPage { report_html } => Some(report_html),
        LoadOutcome::Pass | LoadOutcome::SettingsPage => None,
    };

    Json(LoadCheckResponse { route, report_html })
}
