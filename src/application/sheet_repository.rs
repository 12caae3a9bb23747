// Repository trait for spreadsheet-backed data access
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::row::Row;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Request to sheet proxy failed: {0}")]
    Transport(String),

    #[error("Sheet proxy answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode sheet response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SheetRepository: Send + Sync {
    /// Fetch every row of a resource. A response with an unexpected shape
    /// yields an empty list rather than an error.
    async fn fetch_rows(&self, base_url: &str, resource: &str) -> Result<Vec<Row>, SheetError>;

    /// Append one row, sent as `{ <key>: fields }`. Returns the echoed body.
    async fn append_row(
        &self,
        base_url: &str,
        resource: &str,
        key: &str,
        fields: Value,
    ) -> Result<Value, SheetError>;
}
