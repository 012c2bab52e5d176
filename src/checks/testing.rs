//! Test doubles shared by the check tests

use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Router};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{DiagnosticsContext, FsProbe, PreflightPaths};
use crate::headscale::{ApiKey, ApiKeyInfo, HeadscaleApi, HeadscaleError, Renewal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    Execute,
}

/// In-memory filesystem: everything exists and is accessible unless told
/// otherwise.
#[derive(Debug, Default)]
pub struct FakeProbe {
    missing: HashSet<PathBuf>,
    denied: HashSet<(PathBuf, Access)>,
    owners: HashMap<PathBuf, (u32, u32)>,
}

impl FakeProbe {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn missing(mut self, path: &str) -> Self {
        self.missing.insert(PathBuf::from(path));
        self
    }

    pub fn deny(mut self, path: &str, access: Access) -> Self {
        self.denied.insert((PathBuf::from(path), access));
        self
    }

    /// Paths default to `1000:1000`
    pub fn owned_by(mut self, path: &str, uid: u32, gid: u32) -> Self {
        self.owners.insert(PathBuf::from(path), (uid, gid));
        self
    }

    fn allowed(&self, path: &Path, access: Access) -> bool {
        self.exists(path) && !self.denied.contains(&(path.to_path_buf(), access))
    }
}

impl FsProbe for FakeProbe {
    fn exists(&self, path: &Path) -> bool {
        !self.missing.contains(path)
    }

    fn can_read(&self, path: &Path) -> bool {
        self.allowed(path, Access::Read)
    }

    fn can_write(&self, path: &Path) -> bool {
        self.allowed(path, Access::Write)
    }

    fn can_execute(&self, path: &Path) -> bool {
        self.allowed(path, Access::Execute)
    }

    fn owner(&self, path: &Path) -> Option<(u32, u32)> {
        let owner = self.owners.get(path).copied().unwrap_or((1000, 1000));
        self.exists(path).then_some(owner)
    }
}

/// Headscale client with a canned key-test status
pub struct FakeHeadscale {
    url: String,
    test_status: u16,
    key: Option<ApiKey>,
    fail_renewal: bool,
    pub renew_calls: AtomicUsize,
    pub stored: Mutex<Vec<ApiKey>>,
}

impl FakeHeadscale {
    pub fn new(url: &str, test_status: u16) -> Self {
        Self {
            url: url.to_string(),
            test_status,
            key: Some(ApiKey::new("abcdefghij.secret")),
            fail_renewal: false,
            renew_calls: AtomicUsize::new(0),
            stored: Mutex::new(Vec::new()),
        }
    }

    pub fn without_key(mut self) -> Self {
        self.key = None;
        self
    }

    pub fn failing_renewal(mut self) -> Self {
        self.fail_renewal = true;
        self
    }

    pub fn renewals(&self) -> usize {
        self.renew_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeadscaleApi for FakeHeadscale {
    fn get_url(&self) -> String {
        self.url.clone()
    }

    async fn get_api_key(&self) -> Result<ApiKey, HeadscaleError> {
        self.key
            .clone()
            .ok_or_else(|| HeadscaleError::EmptyKey(PathBuf::from("/data/key.txt")))
    }

    async fn set_api_key(&self, key: &ApiKey) -> Result<(), HeadscaleError> {
        self.stored.lock().unwrap().push(key.clone());
        Ok(())
    }

    async fn test_api_key(&self, _url: &str, _key: &ApiKey) -> Result<u16, HeadscaleError> {
        Ok(self.test_status)
    }

    async fn api_key_info(&self, _url: &str, key: &ApiKey) -> Result<ApiKeyInfo, HeadscaleError> {
        Ok(ApiKeyInfo {
            id: "1".into(),
            prefix: key.prefix().to_string(),
            expiration: None,
            created_at: None,
            last_seen: None,
        })
    }

    async fn renew_api_key(&self, _url: &str, key: &ApiKey) -> Result<Renewal, HeadscaleError> {
        self.renew_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_renewal {
            return Err(HeadscaleError::UnknownKey(key.prefix().to_string()));
        }
        Ok(Renewal::NotNeeded { expires_at: None })
    }
}

/// Serve `/health` with a fixed status on an ephemeral port
pub async fn spawn_health(status: StatusCode) -> String {
    let app = Router::new().route("/health", get(move || async move { status }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn context(probe: FakeProbe, headscale: FakeHeadscale) -> DiagnosticsContext {
    context_with(probe, Arc::new(headscale))
}

pub fn context_with(probe: FakeProbe, headscale: Arc<FakeHeadscale>) -> DiagnosticsContext {
    DiagnosticsContext::new(
        headscale,
        reqwest::Client::new(),
        Arc::new(probe),
        PreflightPaths::default(),
    )
}
