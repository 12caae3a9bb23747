// HTTP request handlers
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::application::registry_service::SubmitError;
use crate::application::settings_service::SettingsError;
use crate::application::sheet_repository::SheetError;
use crate::domain::equipment::sort_by_health;
use crate::domain::field::{AnomalyView, HeatView, ProtectionView};
use crate::domain::registry::{EntryForm, ValidationError};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown equipment: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upstream sheet error: {0}")]
    Upstream(#[from] SheetError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Failed to encode response")]
    Encoding(StatusCode),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Settings(SettingsError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Settings(SettingsError::Persist(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Encoding(status) => *status,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation",
            ApiError::Upstream(_) => "upstream",
            ApiError::Settings(SettingsError::InvalidUrl(_)) => "invalid_url",
            ApiError::Settings(SettingsError::Persist(_)) => "persist",
            ApiError::Encoding(_) => "encoding",
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => ApiError::Validation(e),
            SubmitError::Upstream(e) => ApiError::Upstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = json!({ "error": self.code(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

async fn respond<T: Serialize>(headers: &HeaderMap, data: &T, status: StatusCode) -> ApiResult {
    json_response(data, status, accepts_brotli(headers))
        .await
        .map_err(ApiError::Encoding)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentOrder {
    #[default]
    Fleet,
    Health,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: EquipmentOrder,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub sns: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUrlUpdate {
    pub api_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiUrlView {
    api_url: String,
    default_api_url: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// All equipment groups, in fleet order or worst health first (`?order=health`)
pub async fn list_equipment(
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let snapshot = state.dashboard.snapshot().await;
    match query.order {
        EquipmentOrder::Fleet => respond(&headers, &snapshot.groups, StatusCode::OK).await,
        EquipmentOrder::Health => {
            let mut groups = snapshot.groups.clone();
            sort_by_health(&mut groups);
            respond(&headers, &groups, StatusCode::OK).await
        }
    }
}

pub async fn get_equipment(
    Path(sn): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let group = state.dashboard.group(&sn).await.ok_or_else(|| ApiError::NotFound(sn.clone()))?;
    respond(&headers, &group, StatusCode::OK).await
}

pub async fn equipment_trends(
    Path(sn): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let analysis = state.dashboard.analyze_trends(&sn).await.ok_or_else(|| ApiError::NotFound(sn.clone()))?;
    respond(&headers, &analysis, StatusCode::OK).await
}

pub async fn compare(
    Query(query): Query<CompareQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let selected: Vec<String> = query
        .sns
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|sn| !sn.is_empty())
        .map(String::from)
        .collect();

    let comparison = state.dashboard.compare(&selected).await;
    respond(&headers, &comparison, StatusCode::OK).await
}

pub async fn fleet_stats(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    respond(&headers, &state.dashboard.stats().await, StatusCode::OK).await
}

pub async fn list_heat(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.dashboard.snapshot().await;
    let views: Vec<HeatView> = snapshot.heat.iter().cloned().map(HeatView::from).collect();
    respond(&headers, &views, StatusCode::OK).await
}

pub async fn list_anomalies(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.dashboard.snapshot().await;
    let views: Vec<AnomalyView> = snapshot.anomalies.iter().cloned().map(AnomalyView::from).collect();
    respond(&headers, &views, StatusCode::OK).await
}

pub async fn list_protection(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.dashboard.snapshot().await;
    let views: Vec<ProtectionView> = snapshot.protection.iter().cloned().map(ProtectionView::from).collect();
    respond(&headers, &views, StatusCode::OK).await
}

pub async fn list_registry(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.dashboard.snapshot().await;
    respond(&headers, &snapshot.registry, StatusCode::OK).await
}

pub async fn fleet_insight(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    respond(&headers, &state.dashboard.fleet_insight().await, StatusCode::OK).await
}

pub async fn snapshot_errors(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.dashboard.snapshot().await;
    respond(&headers, &snapshot.errors, StatusCode::OK).await
}

pub async fn refresh(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let outcome = state.dashboard.refresh().await;
    respond(&headers, &outcome, StatusCode::OK).await
}

/// Append a manual log entry to the registry sheet
pub async fn submit_entry(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(form): Json<EntryForm>,
) -> ApiResult {
    let entry = state.registry.submit(form).await?;
    spawn_refresh(&state);
    respond(&headers, &entry, StatusCode::CREATED).await
}

pub async fn get_api_url(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult {
    let view = ApiUrlView {
        api_url: state.settings.api_url().await,
        default_api_url: state.settings.default_api_url().to_string(),
    };
    respond(&headers, &view, StatusCode::OK).await
}

/// Switch the sheet endpoint and reload from it in the background
pub async fn put_api_url(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ApiUrlUpdate>,
) -> ApiResult {
    let api_url = state.settings.set_api_url(&update.api_url).await?;
    spawn_refresh(&state);

    let view = ApiUrlView {
        api_url,
        default_api_url: state.settings.default_api_url().to_string(),
    };
    respond(&headers, &view, StatusCode::OK).await
}

/// Reload in the background. Overlapping loads queue one follow-up.
fn spawn_refresh(state: &AppState) {
    let dashboard = state.dashboard.clone();
    tokio::spawn(async move {
        dashboard.refresh().await;
    });
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // Compression is handled in json_response, so no CompressionLayer here
    Router::new()
        .route("/healthz", get(health_check))
        .route("/equipment", get(list_equipment))
        .route("/equipment/:sn", get(get_equipment))
        .route("/equipment/:sn/trends", get(equipment_trends))
        .route("/compare", get(compare))
        .route("/stats", get(fleet_stats))
        .route("/heat", get(list_heat))
        .route("/anomalies", get(list_anomalies))
        .route("/protection", get(list_protection))
        .route("/registry", get(list_registry).post(submit_entry))
        .route("/insights", get(fleet_insight))
        .route("/snapshot/errors", get(snapshot_errors))
        .route("/refresh", axum::routing::post(refresh))
        .route("/settings/api-url", get(get_api_url).put(put_api_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
