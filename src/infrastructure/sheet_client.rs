// Spreadsheet REST proxy client
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::application::sheet_repository::{SheetError, SheetRepository};
use crate::domain::row::Row;

#[derive(Debug, Clone)]
pub struct SheetClient {
    client: reqwest::Client,
}

impl From<reqwest::Error> for SheetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SheetError::Decode(err.to_string())
        } else {
            SheetError::Transport(err.to_string())
        }
    }
}

impl SheetClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn resource_url(base_url: &str, resource: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(resource)
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(SheetError::Status { status, body })
    }
}

/// Unwrap the proxy envelope `{ "<resource>": [rows] }`. The key named after
/// the resource wins, then the first array-valued key. Any other shape is
/// treated as an empty resource.
pub fn extract_rows(body: Value, resource: &str) -> Vec<Row> {
    let Value::Object(mut envelope) = body else {
        tracing::warn!("Resource {} did not return a JSON object", resource);
        return Vec::new();
    };

    let rows = match envelope.remove(resource) {
        Some(Value::Array(rows)) => rows,
        _ => match envelope.into_iter().find_map(|(_, v)| match v {
            Value::Array(rows) => Some(rows),
            _ => None,
        }) {
            Some(rows) => rows,
            None => {
                tracing::warn!("Resource {} returned no row list", resource);
                return Vec::new();
            }
        },
    };

    let total = rows.len();
    let objects: Vec<Row> = rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if objects.len() < total {
        tracing::debug!("Dropped {} non-object rows from {}", total - objects.len(), resource);
    }
    objects
}

#[async_trait]
impl SheetRepository for SheetClient {
    async fn fetch_rows(&self, base_url: &str, resource: &str) -> Result<Vec<Row>, SheetError> {
        let url = Self::resource_url(base_url, resource);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body = response.json::<Value>().await?;

        Ok(extract_rows(body, resource))
    }

    async fn append_row(
        &self,
        base_url: &str,
        resource: &str,
        key: &str,
        fields: Value,
    ) -> Result<Value, SheetError> {
        let url = Self::resource_url(base_url, resource);
        let mut payload = Map::new();
        payload.insert(key.to_string(), fields);

        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(&payload).send().await?;
        let response = Self::check_status(response).await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SheetError::Decode(e.to_string()))
    }
}
