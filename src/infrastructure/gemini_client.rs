// Gemini generateContent client for narrative insights
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

use crate::application::insight_provider::{InsightError, InsightProvider};
use crate::domain::equipment::EquipmentGroup;
use crate::domain::insight::{FleetInsight, FleetSummaryLine, TrendAnalysis};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InsightError::Decode(err.to_string())
        } else {
            InsightError::Transport(err.to_string())
        }
    }
}

impl GeminiClient {
    pub fn new(
        endpoint: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint,
            urlencoding::encode(&self.model)
        )
    }

    fn request_body(prompt: &str, schema: Value) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        })
    }

    async fn generate<T: DeserializeOwned>(&self, prompt: &str, schema: Value) -> Result<T, InsightError> {
        let api_key = self.api_key.as_deref().ok_or(InsightError::MissingCredential)?;

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(prompt, schema))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Status { status, body });
        }

        let body = response.json::<GenerateResponse>().await?;
        decode_generation(body)
    }
}

/// Join the text parts of the first candidate and decode them as `T`
fn decode_generation<T: DeserializeOwned>(body: GenerateResponse) -> Result<T, InsightError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InsightError::EmptyResponse);
    }
    serde_json::from_str(&text).map_err(|e| InsightError::Decode(e.to_string()))
}

#[async_trait]
impl InsightProvider for GeminiClient {
    async fn fleet_insight(&self, summary: &[FleetSummaryLine]) -> Result<FleetInsight, InsightError> {
        let data = serde_json::to_string(summary).map_err(|e| InsightError::Decode(e.to_string()))?;
        let prompt = format!(
            "As a DGA specialist (IEEE C57.104), review the current state of this transformer fleet: {data}. \
             Give an executive health summary, name the critical serial numbers and recommend immediate actions."
        );

        tracing::debug!("Requesting fleet insight for {} units", summary.len());
        self.generate(&prompt, FleetInsight::response_schema()).await
    }

    async fn trend_analysis(&self, group: &EquipmentGroup) -> Result<TrendAnalysis, InsightError> {
        let history = serde_json::to_string(&group.history).map_err(|e| InsightError::Decode(e.to_string()))?;
        let prompt = format!(
            "Analyze the full gas history of transformer SN {} (TAG {}). History, oldest first: {history}. \
             Consider the gas evolution rate in ppm/month and check for developing thermal or electrical faults. \
             Answer with summary, patterns and riskLevel (Baixo, Médio, Alto).",
            group.sn, group.tag
        );

        tracing::debug!("Requesting trend analysis for {} ({} samples)", group.sn, group.history.len());
        self.generate(&prompt, TrendAnalysis::response_schema()).await
    }
}
