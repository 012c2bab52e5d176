//! Headscale API access
//!
//! The preflight checks and the key guard only talk to [`HeadscaleApi`];
//! [`HttpHeadscaleClient`] is the production implementation backed by the
//! headscale REST API and the local credential file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod client;
pub mod key_store;

pub use client::HttpHeadscaleClient;
pub use key_store::KeyStore;

/// Headscale identifies API keys by their first 10 characters
pub const API_KEY_PREFIX_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum HeadscaleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to access key file {}: {source}", .path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Key file {} is empty", .0.display())]
    EmptyKey(PathBuf),

    #[error("API key with prefix {0} is not known to the server")]
    UnknownKey(String),
}

/// An API key. Debug output only shows the prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn prefix(&self) -> &str {
        match self.0.char_indices().nth(API_KEY_PREFIX_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}...)", self.prefix())
    }
}

/// Key metadata as listed by `GET /api/v1/apikey`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfo {
    #[serde(default)]
    pub id: String,
    pub prefix: String,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Outcome of a renewal attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renewal {
    /// Expiry is outside the renewal window (or the key never expires)
    NotNeeded { expires_at: Option<DateTime<Utc>> },
    /// A replacement key was issued and stored
    Renewed { expires_at: DateTime<Utc> },
}

#[async_trait]
pub trait HeadscaleApi: Send + Sync {
    /// Base URL of the headscale server, without trailing slash
    fn get_url(&self) -> String;

    /// Load the stored API key
    async fn get_api_key(&self) -> Result<ApiKey, HeadscaleError>;

    /// Replace the stored API key
    async fn set_api_key(&self, key: &ApiKey) -> Result<(), HeadscaleError>;

    /// Status code returned by an authenticated request made with `key`
    async fn test_api_key(&self, url: &str, key: &ApiKey) -> Result<u16, HeadscaleError>;

    async fn api_key_info(&self, url: &str, key: &ApiKey) -> Result<ApiKeyInfo, HeadscaleError>;

    /// Issue and store a replacement key if `key` is close to expiring
    async fn renew_api_key(&self, url: &str, key: &ApiKey) -> Result<Renewal, HeadscaleError>;
}
