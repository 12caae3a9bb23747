use serde::Deserialize;

use crate::domain::dashboard::Resource;
use crate::domain::policy::{ClassificationPolicy, ScorePolicy, ThresholdPolicy};

pub const DEFAULT_SHEET_URL: &str = "https://api.sheety.co/08e6cbbffee520029dcb64480d35d1a8/controleasi";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sheet: SheetSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub preferences: PreferenceSettings,
    #[serde(default)]
    pub thresholds: ThresholdPolicy,
    #[serde(default)]
    pub score: ScorePolicy,
}

impl AppConfig {
    pub fn policy(&self) -> ClassificationPolicy {
        ClassificationPolicy {
            thresholds: self.thresholds,
            score: self.score.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SheetSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub resources: ResourceNames,
    pub registry_key: String,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHEET_URL.to_string(),
            timeout_secs: 30,
            resources: ResourceNames::default(),
            registry_key: "registro".to_string(),
        }
    }
}

/// Sheet tab names backing each logical resource
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ResourceNames {
    pub readings: String,
    pub heat: String,
    pub anomalies: String,
    pub protection: String,
    pub registry: String,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            readings: "trafo".to_string(),
            heat: "aquecimento".to_string(),
            anomalies: "anomalias".to_string(),
            protection: "releunit".to_string(),
            registry: "registro".to_string(),
        }
    }
}

impl ResourceNames {
    pub fn name(&self, resource: Resource) -> &str {
        match resource {
            Resource::Readings => &self.readings,
            Resource::Heat => &self.heat,
            Resource::Anomalies => &self.anomalies,
            Resource::Protection => &self.protection,
            Resource::Registry => &self.registry,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-pro-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PreferenceSettings {
    pub path: String,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self { path: "data/preferences.toml".to_string() }
    }
}

/// Load `config/dashboard` (optional) layered with `GRID__*` env variables.
/// A bare `API_KEY` fills in the AI credential when nothing else set it.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("GRID").separator("__").try_parsing(true))
        .build()?;

    let mut app: AppConfig = settings.try_deserialize()?;
    if app.ai.api_key.as_deref().is_none_or(str::is_empty) {
        app.ai.api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
    }
    Ok(app)
}
