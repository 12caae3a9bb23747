// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::registry_service::RegistryService;
use crate::application::settings_service::SettingsService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    pub registry: RegistryService,
    pub settings: SettingsService,
}
