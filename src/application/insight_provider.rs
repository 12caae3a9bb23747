// Provider trait for narrative insights from a language model
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::equipment::EquipmentGroup;
use crate::domain::insight::{FleetInsight, FleetSummaryLine, TrendAnalysis};

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("No API credential configured for the insight service")]
    MissingCredential,

    #[error("Insight request failed: {0}")]
    Transport(String),

    #[error("Insight service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Insight service returned no content")]
    EmptyResponse,

    #[error("Malformed insight payload: {0}")]
    Decode(String),
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Executive summary of the whole fleet
    async fn fleet_insight(&self, summary: &[FleetSummaryLine]) -> Result<FleetInsight, InsightError>;

    /// Trend diagnosis over one unit's full history
    async fn trend_analysis(&self, group: &EquipmentGroup) -> Result<TrendAnalysis, InsightError>;
}
