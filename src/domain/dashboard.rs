// Dashboard domain model - the result of one refresh cycle
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::equipment::EquipmentGroup;
use super::field::{FieldAnomaly, HeatReading, ProtectionUnit};
use super::registry::ManualEntry;

/// Logical sheet resources fetched on every refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Readings,
    Heat,
    Anomalies,
    Protection,
    Registry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceError {
    pub resource: Resource,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub refreshed_at: Option<DateTime<Utc>>,
    pub groups: Vec<EquipmentGroup>,
    pub heat: Vec<HeatReading>,
    pub anomalies: Vec<FieldAnomaly>,
    pub protection: Vec<ProtectionUnit>,
    pub registry: Vec<ManualEntry>,
    pub errors: Vec<ResourceError>,
}

impl DashboardSnapshot {
    pub fn group(&self, sn: &str) -> Option<&EquipmentGroup> {
        self.groups.iter().find(|g| g.sn == sn)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
