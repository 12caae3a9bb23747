// Equipment domain model - readings grouped per serial number and classified
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::policy::{ClassificationPolicy, ThresholdPolicy};
use super::reading::{DEFAULT_LOCATION, DEFAULT_TAG, Reading, normalize_rows};
use super::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Normal,
    Alerta,
    #[serde(rename = "Crítico")]
    Critico,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Normal => "Normal",
            Status::Alerta => "Alerta",
            Status::Critico => "Crítico",
        }
    }

    /// Classify a single reading against the two-tier policy
    pub fn classify(reading: &Reading, policy: &ThresholdPolicy) -> Self {
        if policy.critical.exceeded_by(reading) {
            Status::Critico
        } else if policy.alert.exceeded_by(reading) {
            Status::Alerta
        } else {
            Status::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentGroup {
    pub sn: String,
    pub tag: String,
    pub local: String,
    pub last_reading: Reading,
    pub history: Vec<Reading>,
    pub status: Status,
    pub health_score: u8,
}

impl EquipmentGroup {
    /// Build a group from the readings of one unit. Returns `None` for an
    /// empty history, since a group without a last reading is meaningless.
    pub fn from_history(
        sn: String,
        mut history: Vec<Reading>,
        policy: &ClassificationPolicy,
    ) -> Option<Self> {
        // Vec::sort_by_key is stable: ties keep their input order
        history.sort_by_key(|r| r.data);
        let last = history.last()?.clone();

        let tag = non_blank_or(&last.tag, DEFAULT_TAG);
        let local = non_blank_or(&last.local, DEFAULT_LOCATION);

        let mut group = Self {
            sn,
            tag,
            local,
            last_reading: last,
            history,
            status: Status::Normal,
            health_score: 0,
        };
        group.reclassify(policy);
        Some(group)
    }

    /// Recompute status and score from the current last reading
    pub fn reclassify(&mut self, policy: &ClassificationPolicy) {
        self.status = Status::classify(&self.last_reading, &policy.thresholds);
        self.health_score = policy.score.score(&self.last_reading);
    }

    pub fn mean_acetylene(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(|r| r.c2h2).sum::<f64>() / self.history.len() as f64
    }
}

fn non_blank_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Partition readings by serial number. Buckets come out in first-seen
/// order and keep input order inside each bucket.
pub fn group_readings(readings: Vec<Reading>, policy: &ClassificationPolicy) -> Vec<EquipmentGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Reading>> = HashMap::new();

    for reading in readings {
        let bucket = buckets.entry(reading.sn.clone()).or_insert_with(|| {
            order.push(reading.sn.clone());
            Vec::new()
        });
        bucket.push(reading);
    }

    order
        .into_iter()
        .filter_map(|sn| {
            let history = buckets.remove(&sn)?;
            EquipmentGroup::from_history(sn, history, policy)
        })
        .collect()
}

/// Full pipeline: normalize raw rows against one `now`, then group and classify
pub fn build_groups(rows: &[Row], now: DateTime<Utc>, policy: &ClassificationPolicy) -> Vec<EquipmentGroup> {
    group_readings(normalize_rows(rows, now), policy)
}

/// Worst health first. The sort is stable, so equal scores keep fleet order.
pub fn sort_by_health(groups: &mut [EquipmentGroup]) {
    groups.sort_by_key(|g| g.health_score);
}
