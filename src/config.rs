//! Service configuration read from the environment
//!
//! `main` merges a `.env` file through dotenvy before calling
//! [`Config::from_env`]. Filesystem locations are fixed and live in
//! [`crate::checks::PreflightPaths`].

use chrono::TimeDelta;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RENEW_WITHIN_DAYS: i64 = 5;
const DEFAULT_KEY_VALIDITY_DAYS: i64 = 90;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// When and for how long the API key gets renewed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    /// Renew once the key expires sooner than this
    pub renew_within: TimeDelta,
    /// Lifetime requested for the replacement key
    pub validity: TimeDelta,
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self {
            renew_within: TimeDelta::days(DEFAULT_RENEW_WITHIN_DAYS),
            validity: TimeDelta::days(DEFAULT_KEY_VALIDITY_DAYS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Headscale base URL, without trailing slash
    pub headscale_url: String,
    pub bind_addr: SocketAddr,
    /// Applied to every outbound HTTP request
    pub request_timeout: Duration,
    pub renewal: RenewalPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any name -> value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let headscale_url = lookup("HS_SERVER")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("HS_SERVER"))?;

        if !headscale_url.starts_with("http://") && !headscale_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "HS_SERVER",
                value: headscale_url,
                reason: "expected an http:// or https:// URL".into(),
            });
        }

        let bind_addr: SocketAddr =
            parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;
        let timeout_secs: u64 =
            parse_or(&lookup, "HS_REQUEST_TIMEOUT_SECS", Some(DEFAULT_TIMEOUT_SECS))?;
        let renew_within_days: i64 =
            parse_or(&lookup, "KEY_RENEW_WITHIN_DAYS", Some(DEFAULT_RENEW_WITHIN_DAYS))?;
        let validity_days: i64 =
            parse_or(&lookup, "KEY_VALIDITY_DAYS", Some(DEFAULT_KEY_VALIDITY_DAYS))?;

        if validity_days <= 0 {
            return Err(ConfigError::Invalid {
                name: "KEY_VALIDITY_DAYS",
                value: validity_days.to_string(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            headscale_url,
            bind_addr,
            request_timeout: Duration::from_secs(timeout_secs),
            renewal: RenewalPolicy {
                renew_within: TimeDelta::days(renew_within_days),
                validity: TimeDelta::days(validity_days),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
