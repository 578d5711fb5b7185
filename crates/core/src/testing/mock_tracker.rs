//! Mock tracker store for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tracker::{SeriesTracker, TrackerError, TrackerStore};

/// In-memory implementation of the TrackerStore trait.
///
/// Reads or writes for chosen series can be made to fail with an I/O error.
#[derive(Debug, Default)]
pub struct MockTrackerStore {
    trackers: Arc<RwLock<HashMap<String, SeriesTracker>>>,
    failing_reads: Arc<RwLock<HashSet<String>>>,
    failing_writes: Arc<RwLock<HashSet<String>>>,
    write_count: AtomicUsize,
}

impl MockTrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read of a series fail.
    pub async fn fail_reads(&self, series_key: &str) {
        self.failing_reads
            .write()
            .await
            .insert(series_key.to_string());
    }

    /// Make every write of a series fail.
    pub async fn fail_writes(&self, series_key: &str) {
        self.failing_writes
            .write()
            .await
            .insert(series_key.to_string());
    }

    pub async fn clear_failures(&self) {
        self.failing_reads.write().await.clear();
        self.failing_writes.write().await.clear();
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn io_error(series_key: &str) -> TrackerError {
        TrackerError::Io {
            path: PathBuf::from(format!("mock://{}.json", series_key)),
            source: std::io::Error::other("mock tracker failure"),
        }
    }
}

#[async_trait]
impl TrackerStore for MockTrackerStore {
    async fn read(&self, series_key: &str) -> Result<SeriesTracker, TrackerError> {
        if self.failing_reads.read().await.contains(series_key) {
            return Err(Self::io_error(series_key));
        }
        Ok(self
            .trackers
            .read()
            .await
            .get(series_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn write(&self, series_key: &str, tracker: &SeriesTracker) -> Result<(), TrackerError> {
        if self.failing_writes.read().await.contains(series_key) {
            return Err(Self::io_error(series_key));
        }
        self.trackers
            .write()
            .await
            .insert(series_key.to_string(), tracker.clone());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
