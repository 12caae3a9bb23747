// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::registry_service::RegistryService;
use crate::application::settings_service::SettingsService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::gemini_client::GeminiClient;
use crate::infrastructure::preference_file::PreferenceFile;
use crate::infrastructure::sheet_client::SheetClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let timeout = Duration::from_secs(app_config.sheet.timeout_secs);
    if app_config.ai.api_key.is_none() {
        tracing::warn!("No AI credential configured, insights will be unavailable");
    }

    // Create adapters (infrastructure layer)
    let sheet = Arc::new(SheetClient::new(timeout)?);
    let insights = Arc::new(GeminiClient::new(
        app_config.ai.endpoint.clone(),
        app_config.ai.model.clone(),
        app_config.ai.api_key.clone(),
        timeout,
    )?);
    let preferences = Arc::new(PreferenceFile::new(&app_config.preferences.path));

    // Create services (application layer)
    let settings = SettingsService::load(preferences, app_config.sheet.base_url.clone()).await;
    let dashboard = DashboardService::new(
        sheet.clone(),
        insights,
        settings.clone(),
        app_config.sheet.resources.clone(),
        app_config.policy(),
    );
    let registry = RegistryService::new(
        sheet,
        settings.clone(),
        app_config.sheet.resources.registry.clone(),
        app_config.sheet.registry_key.clone(),
    );

    // Initial load runs in the background so the server starts immediately
    {
        let dashboard = dashboard.clone();
        tokio::spawn(async move {
            dashboard.refresh().await;
        });
    }

    // Create application state
    let state = Arc::new(AppState {
        dashboard,
        registry,
        settings,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = app_config.server.bind.parse()?;
    tracing::info!("Starting powergrid-monitor on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
