//! Credential file holding the headscale API key

use std::path::{Path, PathBuf};

use super::{ApiKey, HeadscaleError};

/// Plain-text key file, one key, surrounding whitespace ignored
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<ApiKey, HeadscaleError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| HeadscaleError::KeyFile {
                path: self.path.clone(),
                source,
            })?;

        let key = ApiKey::new(raw);
        if key.is_empty() {
            return Err(HeadscaleError::EmptyKey(self.path.clone()));
        }
        Ok(key)
    }

    pub async fn save(&self, key: &ApiKey) -> Result<(), HeadscaleError> {
        tokio::fs::write(&self.path, key.as_str())
            .await
            .map_err(|source| HeadscaleError::KeyFile {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!("Stored API key {} in {}", key.prefix(), self.path.display());
        Ok(())
    }
}
