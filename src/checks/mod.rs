//! Preflight checks run before serving dashboard pages
//!
//! Every check is evaluated on each call, independent of the others, so a
//! single report can list all problems at once. Failures are logged as they
//! are found and rendered as error fragments in [`CheckKind::REPORT_ORDER`].

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::display::{render_message, Severity};
use crate::headscale::HeadscaleApi;

pub mod guard;
pub mod load;
pub mod probe;

#[cfg(test)]
pub(crate) mod testing;

pub use guard::ensure_valid_key;
pub use load::{LoadOutcome, LoadRoute};
pub use probe::{FsProbe, SystemProbe};

// Fixed deployment layout of the dashboard container
const DATA_DIR: &str = "/data";
const KEY_FILE: &str = "/data/key.txt";
const CONFIG_FILES: [&str; 2] = ["/etc/headscale/config.yaml", "/etc/headscale/config.yml"];
const EXPECTED_OWNER: (u32, u32) = (1000, 1000);

/// Locations probed by the preflight checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightPaths {
    pub data_dir: PathBuf,
    pub key_file: PathBuf,
    /// Accepted names for the headscale config, any readable one passes
    pub config_files: Vec<PathBuf>,
    /// UID/GID the data directory is expected to belong to
    pub expected_owner: (u32, u32),
}

impl Default for PreflightPaths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_DIR),
            key_file: PathBuf::from(KEY_FILE),
            config_files: CONFIG_FILES.iter().map(PathBuf::from).collect(),
            expected_owner: EXPECTED_OWNER,
        }
    }
}

impl PreflightPaths {
    fn config_display(&self) -> String {
        self.config_files
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    fn config_dir(&self) -> String {
        self.config_files
            .first()
            .and_then(|p| p.parent())
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    fn config_names(&self) -> String {
        self.config_files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| format!("\"{}\"", name.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" or ")
    }

    fn owner_display(&self) -> String {
        format!("{}:{}", self.expected_owner.0, self.expected_owner.1)
    }
}

/// A single preflight condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ServerReachable,
    DataReadable,
    DataWritable,
    DataExecutable,
    KeyFileExists,
    KeyFileReadable,
    KeyFileWritable,
    ConfigReadable,
}

impl CheckKind {
    /// Order of the fragments in the report. A missing key file has no
    /// fragment; its sub-checks are only present when the file exists.
    pub const REPORT_ORDER: [CheckKind; 7] = [
        CheckKind::ServerReachable,
        CheckKind::ConfigReadable,
        CheckKind::DataWritable,
        CheckKind::DataReadable,
        CheckKind::DataExecutable,
        CheckKind::KeyFileWritable,
        CheckKind::KeyFileReadable,
    ];

    fn log_label(&self, paths: &PreflightPaths) -> String {
        let data = paths.data_dir.display();
        let key = paths.key_file.display();
        match self {
            CheckKind::ServerReachable => "Headscale URL: Response 200".to_string(),
            CheckKind::DataReadable => format!("{} READ", data),
            CheckKind::DataWritable => format!("{} WRITE", data),
            CheckKind::DataExecutable => format!("{} EXEC", data),
            CheckKind::KeyFileExists => format!("{} EXIST", key),
            CheckKind::KeyFileReadable => format!("{} READ", key),
            CheckKind::KeyFileWritable => format!("{} WRITE", key),
            CheckKind::ConfigReadable => format!("{} READ", paths.config_display()),
        }
    }

    /// Error fragment shown for a failed check. A missing key file is the
    /// normal state before onboarding and has none.
    fn fragment(
        &self,
        paths: &PreflightPaths,
        url: &str,
        detail: Option<&str>,
    ) -> Option<String> {
        let data = paths.data_dir.display();
        let key = paths.key_file.display();
        let owner = paths.owner_display();
        let (title, body) = match self {
            CheckKind::KeyFileExists => return None,
            CheckKind::ServerReachable => (
                "Headscale unreachable".to_string(),
                format!(
                    "<p>Your headscale server is either unreachable or not properly configured. \
                     Please ensure your configuration is correct (Check for 200 status on \
                     {}/health failed. Response: {}.)</p>",
                    url,
                    detail.unwrap_or("none")
                ),
            ),
            CheckKind::ConfigReadable => (
                format!("{} not readable", paths.config_display()),
                format!(
                    "<p>{} not readable. Please ensure your headscale configuration file \
                     resides in {} and is named {}</p>",
                    paths.config_display(),
                    paths.config_dir(),
                    paths.config_names()
                ),
            ),
            CheckKind::DataWritable => (
                format!("{} not writable", data),
                format!(
                    "<p>{data} is not writable. Please ensure your permissions are correct. \
                     {data} mount should be writable by UID/GID {owner}.</p>"
                ),
            ),
            CheckKind::DataReadable => (
                format!("{} not readable", data),
                format!(
                    "<p>{data} is not readable. Please ensure your permissions are correct. \
                     {data} mount should be readable by UID/GID {owner}.</p>"
                ),
            ),
            CheckKind::DataExecutable => (
                format!("{} not executable", data),
                format!(
                    "<p>{data} is not executable. Please ensure your permissions are correct. \
                     {data} mount should be readable by UID/GID {owner}. \
                     (chown {owner} /path/to/data && chmod -R 755 /path/to/data)</p>"
                ),
            ),
            CheckKind::KeyFileWritable => (
                format!("{} not writable", key),
                format!(
                    "<p>{key} is not writable. Please ensure your permissions are correct. \
                     {data} mount should be writable by UID/GID {owner}.</p>"
                ),
            ),
            CheckKind::KeyFileReadable => (
                format!("{} not readable", key),
                format!(
                    "<p>{key} is not readable. Please ensure your permissions are correct. \
                     {data} mount should be readable by UID/GID {owner}.</p>"
                ),
            ),
        };
        Some(render_message(Severity::Error, &title, &body))
    }
}

/// Result of one evaluated check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub passed: bool,
    /// Extra failure context, e.g. the status code returned by `/health`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall preflight result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// Only the key file is missing, the expected state before onboarding
    CredentialMissing,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PreflightReport {
    outcomes: Vec<CheckOutcome>,
    html: String,
}

impl PreflightReport {
    fn compose(outcomes: Vec<CheckOutcome>, paths: &PreflightPaths, url: &str) -> Self {
        let html = CheckKind::REPORT_ORDER
            .iter()
            .filter_map(|kind| outcomes.iter().find(|o| o.kind == *kind))
            .filter(|o| !o.passed)
            .filter_map(|o| o.kind.fragment(paths, url, o.detail.as_deref()))
            .collect();

        Self { outcomes, html }
    }

    pub fn verdict(&self) -> Verdict {
        let hard_failure = self
            .outcomes
            .iter()
            .any(|o| !o.passed && o.kind != CheckKind::KeyFileExists);
        if hard_failure {
            Verdict::Failed
        } else if self.failed(CheckKind::KeyFileExists) {
            Verdict::CredentialMissing
        } else {
            Verdict::Pass
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict() == Verdict::Pass
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, kind: CheckKind) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }

    pub fn failed(&self, kind: CheckKind) -> bool {
        self.outcome(kind).map(|o| !o.passed).unwrap_or(false)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Error fragments for the failed checks; empty when nothing rendered
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// Everything the checks need, passed explicitly so tests can swap the
/// filesystem and the headscale client.
pub struct DiagnosticsContext {
    headscale: Arc<dyn HeadscaleApi>,
    http: reqwest::Client,
    probe: Arc<dyn FsProbe>,
    paths: PreflightPaths,
}

impl DiagnosticsContext {
    pub fn new(
        headscale: Arc<dyn HeadscaleApi>,
        http: reqwest::Client,
        probe: Arc<dyn FsProbe>,
        paths: PreflightPaths,
    ) -> Self {
        Self {
            headscale,
            http,
            probe,
            paths,
        }
    }

    pub fn headscale(&self) -> &dyn HeadscaleApi {
        self.headscale.as_ref()
    }

    pub fn paths(&self) -> &PreflightPaths {
        &self.paths
    }

    /// Run every preflight check and compose the report
    pub async fn run_checks(&self) -> PreflightReport {
        let url = self.headscale.get_url();
        let mut outcomes = Vec::with_capacity(8);

        outcomes.push(self.check_server(&url).await);

        let data_dir = self.paths.data_dir.as_path();
        outcomes.push(self.record(CheckKind::DataReadable, self.probe.can_read(data_dir)));
        outcomes.push(self.record(CheckKind::DataWritable, self.probe.can_write(data_dir)));
        outcomes.push(self.record(CheckKind::DataExecutable, self.probe.can_execute(data_dir)));
        self.check_owner(data_dir);

        let key_file = self.paths.key_file.as_path();
        if self.probe.exists(key_file) {
            outcomes.push(self.record(CheckKind::KeyFileExists, true));
            outcomes.push(self.record(CheckKind::KeyFileReadable, self.probe.can_read(key_file)));
            outcomes.push(self.record(CheckKind::KeyFileWritable, self.probe.can_write(key_file)));
        } else {
            tracing::error!(
                "{}: FAILED - expected until an API key is saved",
                CheckKind::KeyFileExists.log_label(&self.paths)
            );
            outcomes.push(CheckOutcome {
                kind: CheckKind::KeyFileExists,
                passed: false,
                detail: None,
            });
        }

        let config_readable = self
            .paths
            .config_files
            .iter()
            .any(|path| self.probe.can_read(path));
        outcomes.push(self.record(CheckKind::ConfigReadable, config_readable));

        let report = PreflightReport::compose(outcomes, &self.paths, &url);
        match report.verdict() {
            Verdict::Pass => tracing::info!("All startup checks passed"),
            Verdict::CredentialMissing => {
                tracing::info!("Startup checks passed, waiting for an API key")
            }
            Verdict::Failed => tracing::error!(
                "Startup checks failed: {} of {} checks",
                report.failures().count(),
                report.outcomes().len()
            ),
        }
        report
    }

    async fn check_server(&self, url: &str) -> CheckOutcome {
        let endpoint = format!("{}/health", url);
        let detail = match self.http.get(&endpoint).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => None,
            Ok(response) => Some(response.status().as_u16().to_string()),
            Err(e) => Some(e.to_string()),
        };

        if let Some(ref detail) = detail {
            tracing::error!(
                "{}: FAILED ({} returned {})",
                CheckKind::ServerReachable.log_label(&self.paths),
                endpoint,
                detail
            );
        }

        CheckOutcome {
            kind: CheckKind::ServerReachable,
            passed: detail.is_none(),
            detail,
        }
    }

    fn record(&self, kind: CheckKind, passed: bool) -> CheckOutcome {
        if !passed {
            tracing::error!("{}: FAILED", kind.log_label(&self.paths));
        }
        CheckOutcome {
            kind,
            passed,
            detail: None,
        }
    }

    fn check_owner(&self, path: &Path) {
        if let Some(owner) = self.probe.owner(path) {
            if owner != self.paths.expected_owner {
                tracing::warn!(
                    "{} is owned by {}:{}, expected {}",
                    path.display(),
                    owner.0,
                    owner.1,
                    self.paths.owner_display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_all_checks_pass() {
        let url = spawn_health(StatusCode::OK).await;
        let ctx = context(FakeProbe::healthy(), FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.verdict(), Verdict::Pass);
        assert!(report.is_pass());
        assert!(report.html().is_empty());
        assert_eq!(report.outcomes().len(), 8);
    }

    #[tokio::test]
    async fn test_data_not_writable_yields_single_fragment() {
        let url = spawn_health(StatusCode::OK).await;
        let probe = FakeProbe::healthy().deny(DATA_DIR, Access::Write);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.verdict(), Verdict::Failed);
        assert_eq!(report.html().matches("<ul class=\"collection\">").count(), 1);
        assert!(report.html().contains("Error - /data not writable"));
        assert!(report.html().contains("UID/GID 1000:1000"));
    }

    #[tokio::test]
    async fn test_missing_key_file_skips_sub_checks() {
        let url = spawn_health(StatusCode::OK).await;
        let probe = FakeProbe::healthy().missing(KEY_FILE);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.verdict(), Verdict::CredentialMissing);
        assert!(!report.is_pass());
        assert!(report.failed(CheckKind::KeyFileExists));
        assert!(report.outcome(CheckKind::KeyFileReadable).is_none());
        assert!(report.outcome(CheckKind::KeyFileWritable).is_none());
        assert!(report.html().is_empty());
    }

    #[tokio::test]
    async fn test_unhealthy_server_reports_status() {
        let url = spawn_health(StatusCode::SERVICE_UNAVAILABLE).await;
        let ctx = context(FakeProbe::healthy(), FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.verdict(), Verdict::Failed);
        let outcome = report.outcome(CheckKind::ServerReachable).unwrap();
        assert_eq!(outcome.detail.as_deref(), Some("503"));
        assert!(report.html().contains("Error - Headscale unreachable"));
        assert!(report.html().contains(&format!("{}/health failed. Response: 503.", url)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let url = "http://127.0.0.1:1".to_string();
        let ctx = context(FakeProbe::healthy(), FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert!(report.failed(CheckKind::ServerReachable));
        assert!(report.outcome(CheckKind::ServerReachable).unwrap().detail.is_some());
    }

    #[tokio::test]
    async fn test_either_config_name_is_accepted() {
        let url = spawn_health(StatusCode::OK).await;
        let probe = FakeProbe::healthy().deny(CONFIG_FILES[0], Access::Read);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));
        assert!(ctx.run_checks().await.is_pass());

        let probe = FakeProbe::healthy()
            .deny(CONFIG_FILES[0], Access::Read)
            .deny(CONFIG_FILES[1], Access::Read);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));
        let report = ctx.run_checks().await;
        assert!(report.failed(CheckKind::ConfigReadable));
        assert!(report
            .html()
            .contains("is named \"config.yaml\" or \"config.yml\""));
    }

    #[tokio::test]
    async fn test_every_failure_reported_in_fixed_order() {
        let url = spawn_health(StatusCode::INTERNAL_SERVER_ERROR).await;
        let probe = FakeProbe::healthy()
            .deny(DATA_DIR, Access::Read)
            .deny(DATA_DIR, Access::Write)
            .deny(DATA_DIR, Access::Execute)
            .deny(KEY_FILE, Access::Read)
            .deny(KEY_FILE, Access::Write)
            .deny(CONFIG_FILES[0], Access::Read)
            .deny(CONFIG_FILES[1], Access::Read);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.failures().count(), 7);

        let titles = [
            "Error - Headscale unreachable",
            "Error - /etc/headscale/config.yaml not readable",
            "Error - /data not writable",
            "Error - /data not readable",
            "Error - /data not executable",
            "Error - /data/key.txt not writable",
            "Error - /data/key.txt not readable",
        ];
        let positions: Vec<usize> = titles
            .iter()
            .map(|t| report.html().find(t).unwrap_or_else(|| panic!("missing {}", t)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    }

    #[tokio::test]
    async fn test_missing_key_file_with_other_failure_is_failed() {
        let url = spawn_health(StatusCode::OK).await;
        let probe = FakeProbe::healthy()
            .missing(KEY_FILE)
            .deny(DATA_DIR, Access::Execute);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.verdict(), Verdict::Failed);
        assert!(report.html().contains("/data not executable"));
        assert!(!report.html().contains("/data/key.txt"));
    }

    #[tokio::test]
    async fn test_data_owner_mismatch_only_warns() {
        let url = spawn_health(StatusCode::OK).await;
        let probe = FakeProbe::healthy().owned_by(DATA_DIR, 0, 0);
        let ctx = context(probe, FakeHeadscale::new(&url, 200));

        let report = ctx.run_checks().await;
        assert_eq!(report.verdict(), Verdict::Pass);
        assert!(report.html().is_empty());
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_only_missing_key_file_has_no_fragment() {
        let paths = PreflightPaths::default();
        assert!(CheckKind::KeyFileExists
            .fragment(&paths, "http://hs", None)
            .is_none());
        for kind in CheckKind::REPORT_ORDER {
            let html = kind.fragment(&paths, "http://hs", Some("500")).unwrap();
            assert!(html.contains("<ul class=\"collection\">"), "{:?}", kind);
        }
        assert!(!CheckKind::REPORT_ORDER.contains(&CheckKind::KeyFileExists));
    }

    #[test]
    fn test_default_paths() {
        let paths = PreflightPaths::default();
        assert_eq!(paths.data_dir, PathBuf::from("/data"));
        assert_eq!(paths.key_file, PathBuf::from("/data/key.txt"));
        assert_eq!(paths.config_files.len(), 2);
        assert_eq!(paths.config_dir(), "/etc/headscale");
    }
}
