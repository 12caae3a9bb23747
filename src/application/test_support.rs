// In-memory fakes for the application seams
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::insight_provider::{InsightError, InsightProvider};
use crate::application::settings_service::{PreferenceStore, SettingsError};
use crate::application::sheet_repository::{SheetError, SheetRepository};
use crate::domain::equipment::EquipmentGroup;
use crate::domain::insight::{FleetInsight, FleetSummaryLine, RiskLevel, TrendAnalysis};
use crate::domain::row::Row;

#[derive(Default)]
pub struct FakeSheet {
    rows: Mutex<HashMap<String, Vec<Row>>>,
    failing: Mutex<HashSet<String>>,
    appended: Mutex<Vec<(String, String, Value)>>,
    fail_writes: bool,
    delay: Option<Duration>,
    fetches: AtomicUsize,
    last_base_url: Mutex<Option<String>>,
}

impl FakeSheet {
    pub fn with_rows(self, resource: &str, rows: Value) -> Self {
        self.set_rows(resource, rows);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn set_rows(&self, resource: &str, rows: Value) {
        let rows = rows
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
            .unwrap_or_default();
        self.rows.lock().unwrap().insert(resource.to_string(), rows);
    }

    pub fn fail(&self, resource: &str) {
        self.failing.lock().unwrap().insert(resource.to_string());
    }

    pub fn appended(&self) -> Vec<(String, String, Value)> {
        self.appended.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_base_url(&self) -> Option<String> {
        self.last_base_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetRepository for FakeSheet {
    async fn fetch_rows(&self, base_url: &str, resource: &str) -> Result<Vec<Row>, SheetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_base_url.lock().unwrap() = Some(base_url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(resource) {
            return Err(SheetError::Transport("connection refused".into()));
        }
        Ok(self.rows.lock().unwrap().get(resource).cloned().unwrap_or_default())
    }

    async fn append_row(
        &self,
        base_url: &str,
        resource: &str,
        key: &str,
        fields: Value,
    ) -> Result<Value, SheetError> {
        if self.fail_writes {
            return Err(SheetError::Status { status: 500, body: "quota".into() });
        }
        let mut wrapped = Map::new();
        wrapped.insert(key.to_string(), fields);
        let body = Value::Object(wrapped);
        self.appended
            .lock()
            .unwrap()
            .push((base_url.to_string(), resource.to_string(), body.clone()));
        Ok(body)
    }
}

pub struct FakeInsights {
    fail: bool,
    delay: Option<Duration>,
}

impl FakeInsights {
    pub fn working() -> Self {
        Self { fail: false, delay: None }
    }

    pub fn failing() -> Self {
        Self { fail: true, delay: None }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl InsightProvider for FakeInsights {
    async fn fleet_insight(&self, summary: &[FleetSummaryLine]) -> Result<FleetInsight, InsightError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(InsightError::MissingCredential);
        }
        Ok(FleetInsight {
            overall_health: format!("{} units reviewed", summary.len()),
            critical_issues: vec![],
            recommendations: vec![],
        })
    }

    async fn trend_analysis(&self, group: &EquipmentGroup) -> Result<TrendAnalysis, InsightError> {
        if self.fail {
            return Err(InsightError::EmptyResponse);
        }
        Ok(TrendAnalysis {
            summary: format!("{} stable", group.sn),
            patterns: vec![],
            risk_level: RiskLevel::Baixo,
            detected_fault: None,
        })
    }
}

#[derive(Default)]
pub struct MemoryPreferences {
    url: Mutex<Option<String>>,
}

impl MemoryPreferences {
    pub fn with(url: &str) -> Self {
        Self { url: Mutex::new(Some(url.to_string())) }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn load_api_url(&self) -> Option<String> {
        self.url.lock().unwrap().clone()
    }

    async fn save_api_url(&self, url: &str) -> Result<(), SettingsError> {
        *self.url.lock().unwrap() = Some(url.to_string());
        Ok(())
    }
}
