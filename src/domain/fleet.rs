// Fleet-wide views - statistics and multi-unit comparison
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::equipment::{EquipmentGroup, Status};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total: usize,
    pub critical: usize,
    pub alert: usize,
    pub normal: usize,
    pub average_oil_temperature: f64,
}

impl FleetStats {
    pub fn from_groups(groups: &[EquipmentGroup]) -> Self {
        let count = |status: Status| groups.iter().filter(|g| g.status == status).count();
        let total = groups.len();
        let oil_sum: f64 = groups.iter().map(|g| g.last_reading.temperatura_oleo).sum();

        Self {
            total,
            critical: count(Status::Critico),
            alert: count(Status::Alerta),
            normal: count(Status::Normal),
            average_oil_temperature: oil_sum / total.max(1) as f64,
        }
    }
}

/// One calendar day on the shared comparison axis, C2H2 per serial number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub sn: String,
    pub tag: String,
    pub status: Status,
    pub mean_acetylene: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub units: Vec<ComparisonEntry>,
    pub series: Vec<ComparisonPoint>,
}

impl Comparison {
    /// Compare the selected units (fleet order, unknown keys ignored)
    pub fn build(groups: &[EquipmentGroup], selected: &[String]) -> Self {
        let chosen: Vec<&EquipmentGroup> = groups
            .iter()
            .filter(|g| selected.iter().any(|sn| sn == &g.sn))
            .collect();

        let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
        for group in &chosen {
            // history is chronological, so the day's last sample wins
            for reading in &group.history {
                by_date
                    .entry(reading.data.date_naive())
                    .or_default()
                    .insert(group.sn.clone(), reading.c2h2);
            }
        }

        let units = chosen
            .iter()
            .map(|g| ComparisonEntry {
                sn: g.sn.clone(),
                tag: g.tag.clone(),
                status: g.status,
                mean_acetylene: g.mean_acetylene(),
                samples: g.history.len(),
            })
            .collect();

        let series = by_date
            .into_iter()
            .map(|(date, values)| ComparisonPoint { date, values })
            .collect();

        Self { units, series }
    }
}
