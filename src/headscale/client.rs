//! Headscale REST client
//!
//! Key endpoints used:
//! - `GET  /api/v1/apikey`        list keys (also the cheapest authenticated probe)
//! - `POST /api/v1/apikey`        create a key with a given expiration
//! - `POST /api/v1/apikey/expire` expire a key by prefix

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ApiKey, ApiKeyInfo, HeadscaleApi, HeadscaleError, KeyStore, Renewal};
use crate::config::{Config, RenewalPolicy};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyList {
    #[serde(default)]
    api_keys: Vec<ApiKeyInfo>,
}

#[derive(Debug, Serialize)]
struct CreateApiKeyRequest {
    expiration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateApiKeyResponse {
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ExpireApiKeyRequest<'a> {
    prefix: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpHeadscaleClient {
    http: Client,
    url: String,
    key_store: KeyStore,
    renewal: RenewalPolicy,
}

impl HttpHeadscaleClient {
    pub fn new(
        http: Client,
        url: impl Into<String>,
        key_store: KeyStore,
        renewal: RenewalPolicy,
    ) -> Self {
        Self {
            http,
            url: url.into().trim_end_matches('/').to_string(),
            key_store,
            renewal,
        }
    }

    pub fn from_config(config: &Config, http: Client, key_store: KeyStore) -> Self {
        Self::new(http, config.headscale_url.clone(), key_store, config.renewal)
    }

    async fn list_api_keys(
        &self,
        url: &str,
        key: &ApiKey,
    ) -> Result<Vec<ApiKeyInfo>, HeadscaleError> {
        let endpoint = format!("{}/api/v1/apikey", url);
        let response = self.http.get(&endpoint).bearer_auth(key.as_str()).send().await?;
        if !response.status().is_success() {
            return Err(HeadscaleError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        let list: ApiKeyList = response.json().await?;
        Ok(list.api_keys)
    }

    async fn create_api_key(
        &self,
        url: &str,
        key: &ApiKey,
        expiration: &str,
    ) -> Result<ApiKey, HeadscaleError> {
        let endpoint = format!("{}/api/v1/apikey", url);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(key.as_str())
            .json(&CreateApiKeyRequest {
                expiration: expiration.to_string(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HeadscaleError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        let created: CreateApiKeyResponse = response.json().await?;
        Ok(ApiKey::new(created.api_key))
    }

    async fn expire_api_key(
        &self,
        url: &str,
        auth: &ApiKey,
        prefix: &str,
    ) -> Result<(), HeadscaleError> {
        let endpoint = format!("{}/api/v1/apikey/expire", url);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(auth.as_str())
            .json(&ExpireApiKeyRequest { prefix })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HeadscaleError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HeadscaleApi for HttpHeadscaleClient {
    fn get_url(&self) -> String {
        self.url.clone()
    }

    async fn get_api_key(&self) -> Result<ApiKey, HeadscaleError> {
        self.key_store.load().await
    }

    async fn set_api_key(&self, key: &ApiKey) -> Result<(), HeadscaleError> {
        self.key_store.save(key).await
    }

    async fn test_api_key(&self, url: &str, key: &ApiKey) -> Result<u16, HeadscaleError> {
        let response = self
            .http
            .get(format!("{}/api/v1/apikey", url))
            .bearer_auth(key.as_str())
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn api_key_info(&self, url: &str, key: &ApiKey) -> Result<ApiKeyInfo, HeadscaleError> {
        self.list_api_keys(url, key)
            .await?
            .into_iter()
            .find(|info| info.prefix == key.prefix())
            .ok_or_else(|| HeadscaleError::UnknownKey(key.prefix().to_string()))
    }

    async fn renew_api_key(&self, url: &str, key: &ApiKey) -> Result<Renewal, HeadscaleError> {
        let info = self.api_key_info(url, key).await?;
        let now = Utc::now();

        let expires_at = match info.expiration {
            Some(expires_at) if expires_at - now < self.renewal.renew_within => expires_at,
            other => {
                tracing::debug!(
                    "API key {} does not need renewal (expires {:?})",
                    key.prefix(),
                    other
                );
                return Ok(Renewal::NotNeeded { expires_at: other });
            }
        };

        tracing::warn!(
            "API key {} expires at {}, requesting a replacement",
            key.prefix(),
            expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        let new_expiration = now + self.renewal.validity;
        let new_key = self
            .create_api_key(url, key, &new_expiration.to_rfc3339_opts(SecondsFormat::Secs, true))
            .await?;
        self.key_store.save(&new_key).await?;

        if let Err(e) = self.expire_api_key(url, &new_key, key.prefix()).await {
            tracing::warn!("Failed to expire previous API key {}: {}", key.prefix(), e);
        }

        tracing::info!("API key renewed as {}", new_key.prefix());
        Ok(Renewal::Renewed {
            expires_at: new_expiration,
        })
    }
}
