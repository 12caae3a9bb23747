// Dashboard service - refresh cycle and ownership of the current snapshot
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

use crate::application::insight_provider::InsightProvider;
use crate::application::settings_service::SettingsService;
use crate::application::sheet_repository::{SheetError, SheetRepository};
use crate::domain::dashboard::{DashboardSnapshot, Resource, ResourceError};
use crate::domain::equipment::{EquipmentGroup, Status, build_groups};
use crate::domain::field::{FieldAnomaly, HeatReading, ProtectionUnit};
use crate::domain::fleet::{Comparison, FleetStats};
use crate::domain::insight::{FleetInsight, FleetSummaryLine, InsightState, TrendAnalysis};
use crate::domain::policy::ClassificationPolicy;
use crate::domain::registry::ManualEntry;
use crate::domain::row::Row;
use crate::infrastructure::config::ResourceNames;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RefreshOutcome {
    Completed { groups: usize, failed: Vec<Resource> },
    Skipped,
}

/// Clears the in-flight flag however the refresh exits
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn SheetRepository>,
    insights: Arc<dyn InsightProvider>,
    settings: SettingsService,
    resources: ResourceNames,
    policy: ClassificationPolicy,
    snapshot: Arc<RwLock<Arc<DashboardSnapshot>>>,
    fleet_insight: Arc<RwLock<InsightState<FleetInsight>>>,
    refreshing: Arc<AtomicBool>,
    rerun: Arc<AtomicBool>,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn SheetRepository>,
        insights: Arc<dyn InsightProvider>,
        settings: SettingsService,
        resources: ResourceNames,
        policy: ClassificationPolicy,
    ) -> Self {
        Self {
            repository,
            insights,
            settings,
            resources,
            policy,
            snapshot: Arc::new(RwLock::new(Arc::new(DashboardSnapshot::default()))),
            fleet_insight: Arc::new(RwLock::new(InsightState::Pending)),
            refreshing: Arc::new(AtomicBool::new(false)),
            rerun: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn fleet_insight(&self) -> InsightState<FleetInsight> {
        self.fleet_insight.read().await.clone()
    }

    pub async fn stats(&self) -> FleetStats {
        FleetStats::from_groups(&self.snapshot().await.groups)
    }

    pub async fn group(&self, sn: &str) -> Option<EquipmentGroup> {
        self.snapshot().await.group(sn).cloned()
    }

    pub async fn compare(&self, selected: &[String]) -> Comparison {
        Comparison::build(&self.snapshot().await.groups, selected)
    }

    /// Fetch every resource concurrently and publish a new snapshot.
    /// A call that overlaps a running load returns `Skipped` and queues one
    /// follow-up load, so triggers arriving mid-load are never lost.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut latest = None;
        loop {
            if self
                .refreshing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                if latest.is_none() {
                    self.rerun.store(true, Ordering::Release);
                    tracing::debug!("Refresh already in flight, queued a follow-up");
                }
                break;
            }
            self.rerun.store(false, Ordering::Release);

            let snapshot = {
                let _in_flight = InFlight(&self.refreshing);
                self.load_snapshot().await
            };
            latest = Some(snapshot);

            if !self.rerun.swap(false, Ordering::AcqRel) {
                break;
            }
            tracing::debug!("Refresh requested during load, reloading");
        }

        let Some(snapshot) = latest else {
            return RefreshOutcome::Skipped;
        };
        let failed: Vec<Resource> = snapshot.errors.iter().map(|e| e.resource).collect();

        // Runs after the guard is released
        if !failed.contains(&Resource::Readings) {
            self.refresh_fleet_insight(&snapshot.groups).await;
        }

        RefreshOutcome::Completed {
            groups: snapshot.groups.len(),
            failed,
        }
    }

    async fn load_snapshot(&self) -> Arc<DashboardSnapshot> {
        let start_time = Instant::now();

        let base_url = self.settings.api_url().await;
        tracing::info!("Refreshing dashboard from {}", base_url);

        let (readings, heat, anomalies, protection, registry) = futures::join!(
            self.fetch(&base_url, Resource::Readings),
            self.fetch(&base_url, Resource::Heat),
            self.fetch(&base_url, Resource::Anomalies),
            self.fetch(&base_url, Resource::Protection),
            self.fetch(&base_url, Resource::Registry),
        );

        let previous = self.snapshot().await;
        let now = Utc::now();
        let mut errors = Vec::new();

        let groups = match readings {
            Ok(rows) => build_groups(&rows, now, &self.policy),
            Err(e) => {
                errors.push(ResourceError { resource: Resource::Readings, message: e.to_string() });
                previous.groups.clone()
            }
        };
        let heat = settle(Resource::Heat, heat, &previous.heat, HeatReading::from_row, &mut errors);
        let anomalies = settle(
            Resource::Anomalies,
            anomalies,
            &previous.anomalies,
            FieldAnomaly::from_row,
            &mut errors,
        );
        let protection = settle(
            Resource::Protection,
            protection,
            &previous.protection,
            ProtectionUnit::from_row,
            &mut errors,
        );
        let registry = settle(Resource::Registry, registry, &previous.registry, ManualEntry::from_row, &mut errors);

        let snapshot = Arc::new(DashboardSnapshot {
            refreshed_at: Some(now),
            groups,
            heat,
            anomalies,
            protection,
            registry,
            errors,
        });
        *self.snapshot.write().await = snapshot.clone();

        tracing::info!(
            "Dashboard refreshed: {} units, {} failed resources in {}ms",
            snapshot.groups.len(),
            snapshot.errors.len(),
            start_time.elapsed().as_millis()
        );

        if snapshot.has_errors() {
            let failed: Vec<Resource> = snapshot.errors.iter().map(|e| e.resource).collect();
            tracing::warn!("Degraded refresh, kept previous data for {:?}", failed);
        }
        for group in snapshot.groups.iter().filter(|g| g.status != Status::Normal) {
            tracing::debug!("{} is {} (score {})", group.sn, group.status.label(), group.health_score);
        }

        snapshot
    }

    /// Per-unit trend diagnosis. `None` when the unit is unknown.
    pub async fn analyze_trends(&self, sn: &str) -> Option<InsightState<TrendAnalysis>> {
        let group = self.group(sn).await?;

        let state = match self.insights.trend_analysis(&group).await {
            Ok(report) => InsightState::Available { report },
            Err(e) => {
                tracing::warn!("Trend analysis for {} unavailable: {}", sn, e);
                InsightState::Unavailable { reason: e.to_string() }
            }
        };
        Some(state)
    }

    async fn refresh_fleet_insight(&self, groups: &[EquipmentGroup]) {
        let state = if groups.is_empty() {
            InsightState::Unavailable { reason: "no equipment readings".to_string() }
        } else {
            let summary: Vec<FleetSummaryLine> = groups.iter().map(FleetSummaryLine::from).collect();
            match self.insights.fleet_insight(&summary).await {
                Ok(report) => InsightState::Available { report },
                Err(e) => {
                    tracing::warn!("Fleet insights unavailable: {}", e);
                    InsightState::Unavailable { reason: e.to_string() }
                }
            }
        };

        if state.is_available() {
            tracing::info!("Fleet insight updated for {} units", groups.len());
        }
        *self.fleet_insight.write().await = state;
    }

    async fn fetch(&self, base_url: &str, resource: Resource) -> Result<Vec<Row>, SheetError> {
        let name = self.resources.name(resource);
        let result = self.repository.fetch_rows(base_url, name).await;

        match &result {
            Ok(rows) => tracing::debug!("Fetched {} rows from {}", rows.len(), name),
            Err(e) => tracing::error!("Error fetching {}: {}", name, e),
        }
        result
    }
}

/// Parse a freshly fetched resource, or keep the previous records on failure
fn settle<T: Clone>(
    resource: Resource,
    result: Result<Vec<Row>, SheetError>,
    previous: &[T],
    parse: fn(&Row) -> T,
    errors: &mut Vec<ResourceError>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows.iter().map(parse).collect(),
        Err(e) => {
            errors.push(ResourceError { resource, message: e.to_string() });
            previous.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeInsights, FakeSheet, MemoryPreferences};
    use serde_json::json;
    use std::time::Duration;

    async fn service(sheet: Arc<FakeSheet>, insights: FakeInsights) -> DashboardService {
        let settings =
            SettingsService::load(Arc::new(MemoryPreferences::default()), "https://proxy.test/fleet".into()).await;
        DashboardService::new(
            sheet,
            Arc::new(insights),
            settings,
            ResourceNames::default(),
            ClassificationPolicy::default(),
        )
    }

    fn populated_sheet() -> FakeSheet {
        FakeSheet::default()
            .with_rows(
                "trafo",
                json!([
                    { "sn": "A", "c2h2": "1.5", "h2": "50", "data": "2024-01-10" },
                    { "sn": "A", "c2h2": "0.1", "h2": "10", "data": "2024-02-10" },
                    { "sn": "B", "c2h2": 3, "temperaturaOleo": 80, "data": "2024-02-01" }
                ]),
            )
            .with_rows("aquecimento", json!([{ "se": "SE-1", "equipamento": "Chave", "temperatura": 72 }]))
            .with_rows("anomalias", json!([{ "os": "77", "prioridade": "Alta", "diasCorridos": 40 }]))
            .with_rows("releunit", json!([{ "parque": "P1", "statusComunica": "Ativo" }]))
            .with_rows("registro", json!([{ "ativoparque": "TR-01", "gravidade": "Crítica" }]))
    }

    #[tokio::test]
    async fn test_refresh_builds_snapshot() {
        let svc = service(Arc::new(populated_sheet()), FakeInsights::working()).await;

        let outcome = svc.refresh().await;
        assert_eq!(outcome, RefreshOutcome::Completed { groups: 2, failed: vec![] });

        let snapshot = svc.snapshot().await;
        assert!(snapshot.refreshed_at.is_some());
        assert_eq!(snapshot.groups[0].sn, "A");
        assert_eq!(snapshot.groups[0].status, Status::Normal);
        assert_eq!(snapshot.groups[1].status, Status::Critico);
        assert_eq!(snapshot.heat.len(), 1);
        assert_eq!(snapshot.anomalies[0].os, "77");
        assert!(snapshot.protection[0].communication_active());
        assert!(snapshot.registry[0].is_critical());
        assert!(!snapshot.has_errors());

        assert!(svc.fleet_insight().await.is_available());
        assert_eq!(svc.stats().await.critical, 1);
    }

    #[tokio::test]
    async fn test_failed_resource_keeps_previous_and_others_update() {
        let sheet = Arc::new(populated_sheet());
        let svc = service(sheet.clone(), FakeInsights::working()).await;
        svc.refresh().await;

        sheet.fail("aquecimento");
        sheet.set_rows("releunit", json!([]));

        let outcome = svc.refresh().await;
        assert_eq!(outcome, RefreshOutcome::Completed { groups: 2, failed: vec![Resource::Heat] });

        let snapshot = svc.snapshot().await;
        assert_eq!(snapshot.heat.len(), 1);
        assert!(snapshot.protection.is_empty());
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].resource, Resource::Heat);
    }

    #[tokio::test]
    async fn test_insight_failure_is_not_fatal() {
        let svc = service(Arc::new(populated_sheet()), FakeInsights::failing()).await;

        let outcome = svc.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Completed { groups: 2, .. }));
        assert_eq!(svc.snapshot().await.groups.len(), 2);
        assert!(matches!(svc.fleet_insight().await, InsightState::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_sheet_gives_empty_fleet() {
        let svc = service(Arc::new(FakeSheet::default()), FakeInsights::working()).await;
        svc.refresh().await;

        assert!(svc.snapshot().await.groups.is_empty());
        assert_eq!(svc.stats().await.total, 0);
        assert!(matches!(svc.fleet_insight().await, InsightState::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_skipped() {
        let sheet = Arc::new(populated_sheet().with_delay(Duration::from_millis(200)));
        let svc = service(sheet.clone(), FakeInsights::working()).await;

        let first = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(svc.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(svc.refresh().await, RefreshOutcome::Skipped);
        assert!(matches!(first.await.unwrap(), RefreshOutcome::Completed { .. }));
        // both overlapping triggers collapse into one follow-up load
        assert_eq!(sheet.fetch_count(), 10);

        // guard released afterwards
        assert!(matches!(svc.refresh().await, RefreshOutcome::Completed { .. }));
        assert_eq!(sheet.fetch_count(), 15);
    }

    #[tokio::test]
    async fn test_endpoint_change_during_load_is_fetched() {
        let sheet = Arc::new(populated_sheet().with_delay(Duration::from_millis(200)));
        let store = Arc::new(MemoryPreferences::default());
        let settings = SettingsService::load(store, "https://proxy.test/fleet".into()).await;
        let svc = DashboardService::new(
            sheet.clone(),
            Arc::new(FakeInsights::working()),
            settings.clone(),
            ResourceNames::default(),
            ClassificationPolicy::default(),
        );

        let first = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        settings.set_api_url("https://mirror.test/fleet").await.unwrap();
        assert_eq!(svc.refresh().await, RefreshOutcome::Skipped);
        first.await.unwrap();

        assert_eq!(sheet.fetch_count(), 10);
        assert_eq!(sheet.last_base_url().as_deref(), Some("https://mirror.test/fleet"));
    }

    #[tokio::test]
    async fn test_slow_insight_does_not_block_next_load() {
        let sheet = Arc::new(populated_sheet());
        let insights = FakeInsights::working().with_delay(Duration::from_millis(300));
        let svc = service(sheet.clone(), insights).await;

        let first = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        // first load is published, only its insight call is still pending
        assert_eq!(sheet.fetch_count(), 5);
        assert!(matches!(svc.refresh().await, RefreshOutcome::Completed { .. }));
        assert_eq!(sheet.fetch_count(), 10);
        first.await.unwrap();
    }

    #[tokio::test]
    async fn test_trend_analysis() {
        let svc = service(Arc::new(populated_sheet()), FakeInsights::working()).await;
        svc.refresh().await;

        assert!(svc.analyze_trends("A").await.unwrap().is_available());
        assert!(svc.analyze_trends("missing").await.is_none());

        let failing = service(Arc::new(populated_sheet()), FakeInsights::failing()).await;
        failing.refresh().await;
        assert!(matches!(
            failing.analyze_trends("A").await,
            Some(InsightState::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_compare_selected_units() {
        let svc = service(Arc::new(populated_sheet()), FakeInsights::working()).await;
        svc.refresh().await;

        let comparison = svc.compare(&["B".to_string()]).await;
        assert_eq!(comparison.units.len(), 1);
        assert_eq!(comparison.units[0].sn, "B");
        assert_eq!(comparison.series.len(), 1);
    }
}
