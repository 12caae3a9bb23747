// Registry service - validates and appends manual log entries
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::application::settings_service::SettingsService;
use crate::application::sheet_repository::{SheetError, SheetRepository};
use crate::domain::registry::{EntryForm, ManualEntry, ValidationError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to save entry to the sheet: {0}")]
    Upstream(#[from] SheetError),
}

#[derive(Clone)]
pub struct RegistryService {
    repository: Arc<dyn SheetRepository>,
    settings: SettingsService,
    resource: String,
    key: String,
}

impl RegistryService {
    pub fn new(
        repository: Arc<dyn SheetRepository>,
        settings: SettingsService,
        resource: String,
        key: String,
    ) -> Self {
        Self {
            repository,
            settings,
            resource,
            key,
        }
    }

    /// Validation happens before any network traffic
    pub async fn submit(&self, form: EntryForm) -> Result<ManualEntry, SubmitError> {
        let entry = form.validate()?;

        let fields = json!({
            "ativoparque": entry.ativoparque,
            "data": entry.data,
            "gravidade": entry.gravidade,
            "tipo": entry.tipo,
            "observacaotecnica": entry.observacaotecnica,
        });

        let base_url = self.settings.api_url().await;
        let echoed = self
            .repository
            .append_row(&base_url, &self.resource, &self.key, fields)
            .await
            .inspect_err(|e| tracing::error!("Saving entry for {} failed: {}", entry.ativoparque, e))?;

        if entry.is_critical() {
            tracing::warn!("Critical log entry saved for {}", entry.ativoparque);
        } else {
            tracing::info!("Saved log entry for {}", entry.ativoparque);
        }
        tracing::debug!("Sheet echoed {}", echoed);
        Ok(entry)
    }
}
