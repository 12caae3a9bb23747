// Settings service - the persisted sheet endpoint preference
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Not an absolute http(s) URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to persist preference: {0}")]
    Persist(String),
}

/// Local storage for the single user preference
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored endpoint URL, `None` when unset or unreadable
    async fn load_api_url(&self) -> Option<String>;

    async fn save_api_url(&self, url: &str) -> Result<(), SettingsError>;
}

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn PreferenceStore>,
    default_url: String,
    current: Arc<RwLock<String>>,
}

impl SettingsService {
    /// Resolve the active endpoint: stored preference first, then the default
    pub async fn load(store: Arc<dyn PreferenceStore>, default_url: String) -> Self {
        let stored = store
            .load_api_url()
            .await
            .and_then(|url| normalize_url(&url).ok());

        let current = match stored {
            Some(url) => {
                tracing::info!("Using stored sheet endpoint {}", url);
                url
            }
            None => default_url.clone(),
        };

        Self {
            store,
            default_url,
            current: Arc::new(RwLock::new(current)),
        }
    }

    pub async fn api_url(&self) -> String {
        self.current.read().await.clone()
    }

    pub fn default_api_url(&self) -> &str {
        &self.default_url
    }

    /// Validate, persist and activate a new endpoint
    pub async fn set_api_url(&self, raw: &str) -> Result<String, SettingsError> {
        let url = normalize_url(raw)?;
        self.store.save_api_url(&url).await?;
        *self.current.write().await = url.clone();
        tracing::info!("Sheet endpoint changed to {}", url);
        Ok(url)
    }
}

fn normalize_url(raw: &str) -> Result<String, SettingsError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| SettingsError::InvalidUrl(trimmed.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(SettingsError::InvalidUrl(trimmed.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
