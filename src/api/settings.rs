//! API key settings endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::display::{duration_color, format_relative, RelativeMode};
use crate::headscale::ApiKey;
use crate::types::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct ApiKeyStatusResponse {
    pub prefix: String,
    pub expiration: Option<DateTime<Utc>>,
    /// e.g. "in 12 days"; absent when the key never expires
    pub expires: Option<String>,
    pub expires_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub prefix: String,
    pub message: String,
}

/// GET /api/settings/key - Describe the stored API key
pub async fn get_api_key(State(state): State<AppState>) -> ApiResult<Json<ApiKeyStatusResponse>> {
    let headscale = state.diagnostics.headscale();
    let key = headscale.get_api_key().await?;
    let info = headscale.api_key_info(&headscale.get_url(), &key).await?;

    let remaining = info.expiration.map(|expiration| expiration - Utc::now());

    Ok(Json(ApiKeyStatusResponse {
        prefix: info.prefix,
        expiration: info.expiration,
        expires: remaining.map(|delta| format_relative(delta, RelativeMode::Expiry)),
        expires_color: remaining.map(|delta| duration_color(delta).to_string()),
    }))
}

/// POST /api/settings/key - Test a new API key and store it if headscale accepts it
pub async fn set_api_key(
    State(state): State<AppState>,
    Json(req): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    let key = ApiKey::new(req.api_key);
    if key.is_empty() {
        return Err(ApiError::BadRequest("api_key must not be empty".into()));
    }

    let headscale = state.diagnostics.headscale();
    let status = headscale.test_api_key(&headscale.get_url(), &key).await?;
    if status != 200 {
        tracing::warn!("Rejected API key {}: headscale returned {}", key.prefix(), status);
        return Err(ApiError::BadRequest(format!(
            "Headscale rejected the API key (status {})",
            status
        )));
    }

    headscale.set_api_key(&key).await?;

    Ok(Json(SetApiKeyResponse {
        success: true,
        prefix: key.prefix().to_string(),
        message: "API key saved".to_string(),
    }))
}
