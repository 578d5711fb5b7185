use std::sync::Arc;
use discsync_core::{Config, ExportScheduler, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<ExportScheduler>,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<ExportScheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn scheduler(&self) -> &Arc<ExportScheduler> {
        &self.scheduler
    }
}
