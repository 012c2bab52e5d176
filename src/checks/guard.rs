//! API key validation before pages that talk to headscale

use crate::headscale::{HeadscaleApi, Renewal};

/// Check that the stored API key is accepted by headscale, renewing it when
/// it is close to expiry. Returns whether the key is usable.
///
/// A failed renewal is logged but does not make a valid key unusable.
pub async fn ensure_valid_key(api: &dyn HeadscaleApi) -> bool {
    let key = match api.get_api_key().await {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!("No usable API key: {}", e);
            return false;
        }
    };
    let url = api.get_url();

    match api.test_api_key(&url, &key).await {
        Ok(200) => {}
        Ok(status) => {
            tracing::warn!("API key {} rejected by headscale (status {})", key.prefix(), status);
            return false;
        }
        Err(e) => {
            tracing::warn!("Failed to test API key {}: {}", key.prefix(), e);
            return false;
        }
    }

    match api.renew_api_key(&url, &key).await {
        Ok(Renewal::Renewed { expires_at }) => {
            tracing::info!("API key renewed, valid until {}", expires_at)
        }
        Ok(Renewal::NotNeeded { .. }) => {}
        Err(e) => tracing::error!("Failed to renew API key {}: {}", key.prefix(), e),
    }
    true
}
