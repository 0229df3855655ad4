use std::sync::Arc;

use marquee_core::{
    CatalogSync, CategoryStore, Config, FavoriteToggle, MovieSource, SanitizedConfig,
    SyncScheduler,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn CategoryStore>,
    source: Arc<dyn MovieSource>,
    sync: Arc<CatalogSync>,
    favorites: FavoriteToggle,
    scheduler: Option<Arc<SyncScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CategoryStore>,
        source: Arc<dyn MovieSource>,
        sync: Arc<CatalogSync>,
        scheduler: Option<Arc<SyncScheduler>>,
    ) -> Self {
        let favorites = FavoriteToggle::new(Arc::clone(&catalog));
        Self {
            config,
            catalog,
            source,
            sync,
            favorites,
            scheduler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &dyn CategoryStore {
        self.catalog.as_ref()
    }

    pub fn source(&self) -> &dyn MovieSource {
        self.source.as_ref()
    }

    pub fn sync(&self) -> &CatalogSync {
        self.sync.as_ref()
    }

    pub fn favorites(&self) -> &FavoriteToggle {
        &self.favorites
    }

    /// Background scheduler, if sync is enabled.
    pub fn scheduler(&self) -> Option<&Arc<SyncScheduler>> {
        self.scheduler.as_ref()
    }
}
