//! Per-series season progress tracker.
//!
//! One small JSON file per series records, for every season, the last
//! exported episode and which discs have been exported. It is read once when
//! a batch starts and written once when it completes.

mod file_store;
mod types;

pub use file_store::FileTrackerStore;
pub use types::{
    parse_season_key, season_key, season_record, SeasonTrackerRecord, SeriesTracker,
};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from tracker persistence.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize tracker: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid series key: {0}")]
    InvalidKey(String),
}

/// Durable storage for series trackers.
///
/// A missing or unreadable-as-JSON record is an empty tracker, not an error.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    async fn read(&self, series_key: &str) -> Result<SeriesTracker, TrackerError>;

    /// Replace the stored tracker atomically.
    async fn write(&self, series_key: &str, tracker: &SeriesTracker) -> Result<(), TrackerError>;
}
