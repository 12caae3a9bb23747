// File-backed preference store (TOML)
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::settings_service::{PreferenceStore, SettingsError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PreferenceFile {
    path: PathBuf,
}

impl PreferenceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PreferenceStore for PreferenceFile {
    async fn load_api_url(&self) -> Option<String> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Cannot read preferences {}: {}", self.path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Preferences>(&raw) {
            Ok(prefs) => prefs.api_url.filter(|url| !url.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Ignoring malformed preferences {}: {}", self.path.display(), e);
                None
            }
        }
    }

    async fn save_api_url(&self, url: &str) -> Result<(), SettingsError> {
        let prefs = Preferences { api_url: Some(url.to_string()) };
        let raw = toml::to_string(&prefs).map_err(|e| SettingsError::Persist(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SettingsError::Persist(e.to_string()))?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| SettingsError::Persist(e.to_string()))
    }
}
