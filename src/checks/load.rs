//! Page-load gate combining the preflight report and the key guard

use serde::Serialize;

use super::{ensure_valid_key, DiagnosticsContext, Verdict};

/// Which view the dashboard should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Environment and API key are fine
    Pass,
    /// Preflight failed; the report lists every problem
    ErrorPage { report_html: String },
    /// No usable API key yet
    SettingsPage,
}

impl LoadOutcome {
    /// Routing hint consumed by the page layer
    pub fn route(&self) -> LoadRoute {
        match self {
            LoadOutcome::Pass => LoadRoute::Pass,
            LoadOutcome::ErrorPage { .. } => LoadRoute::ErrorPage,
            LoadOutcome::SettingsPage => LoadRoute::SettingsPage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadRoute {
    #[serde(rename = "Pass")]
    Pass,
    #[serde(rename = "error_page")]
    ErrorPage,
    #[serde(rename = "settings_page")]
    SettingsPage,
}

impl LoadRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadRoute::Pass => "Pass",
            LoadRoute::ErrorPage => "error_page",
            LoadRoute::SettingsPage => "settings_page",
        }
    }
}

impl DiagnosticsContext {
    pub async fn load_checks(&self) -> LoadOutcome {
        let report = self.run_checks().await;
        match report.verdict() {
            Verdict::Failed => LoadOutcome::ErrorPage {
                report_html: report.into_html(),
            },
            Verdict::CredentialMissing => LoadOutcome::SettingsPage,
            Verdict::Pass => {
                if ensure_valid_key(self.headscale()).await {
                    LoadOutcome::Pass
                } else {
                    LoadOutcome::SettingsPage
                }
            }
        }
    }
}
