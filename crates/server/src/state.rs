use std::sync::Arc;

use clipforge_core::{Config, MediaEngine, MediaService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: MediaService,
}

impl AppState {
    pub fn new(config: Config, service: MediaService) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &MediaService {
        &self.service
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        self.service.engine()
    }
}
