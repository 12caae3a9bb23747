// Narrative insight models returned by the language-model service
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::equipment::{EquipmentGroup, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetInsight {
    pub overall_health: String,
    #[serde(default)]
    pub critical_issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl FleetInsight {
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "overallHealth": { "type": "STRING" },
                "criticalIssues": { "type": "ARRAY", "items": { "type": "STRING" } },
                "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["overallHealth", "criticalIssues", "recommendations"]
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Baixo,
    #[serde(rename = "Médio", alias = "Medio")]
    Medio,
    Alto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub summary: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_fault: Option<String>,
}

impl TrendAnalysis {
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "summary": { "type": "STRING" },
                "patterns": { "type": "ARRAY", "items": { "type": "STRING" } },
                "riskLevel": { "type": "STRING", "enum": ["Baixo", "Médio", "Alto"] },
                "detectedFault": { "type": "STRING" }
            },
            "required": ["summary", "patterns", "riskLevel"]
        })
    }
}

/// Best-effort slot for a narrative result. Failures never leave this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum InsightState<T> {
    Pending,
    Available { report: T },
    Unavailable { reason: String },
}

impl<T> InsightState<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, InsightState::Available { .. })
    }
}

/// Compact per-unit line sent along with a fleet insight request
#[derive(Debug, Clone, Serialize)]
pub struct FleetSummaryLine {
    pub sn: String,
    pub tag: String,
    pub status: Status,
    pub c2h2: f64,
    pub h2: f64,
    pub tcg: f64,
    pub trend: String,
}

impl From<&EquipmentGroup> for FleetSummaryLine {
    fn from(group: &EquipmentGroup) -> Self {
        let trend = if group.history.len() > 1 {
            format!("history of {} samples", group.history.len())
        } else {
            "first sample".to_string()
        };

        Self {
            sn: group.sn.clone(),
            tag: group.tag.clone(),
            status: group.status,
            c2h2: group.last_reading.c2h2,
            h2: group.last_reading.h2,
            tcg: group.last_reading.tcg(),
            trend,
        }
    }
}
