//! Mock episode catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, EpisodeCatalogSource, SeriesEpisodeCatalog};

/// Mock implementation of the EpisodeCatalogSource trait.
#[derive(Debug, Default)]
pub struct MockCatalogSource {
    catalogs: Arc<RwLock<HashMap<String, SeriesEpisodeCatalog>>>,
    /// If set, the next lookup will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
    lookup_count: AtomicUsize,
}

impl MockCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog under its series name.
    pub async fn set_catalog(&self, catalog: SeriesEpisodeCatalog) {
        self.catalogs
            .write()
            .await
            .insert(catalog.series_name.clone(), catalog);
    }

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EpisodeCatalogSource for MockCatalogSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup(&self, series_name: &str) -> Result<SeriesEpisodeCatalog, CatalogError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.catalogs
            .read()
            .await
            .get(series_name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(series_name.to_string()))
    }
}
