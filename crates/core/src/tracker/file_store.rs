//! JSON-file tracker store: `<dir>/<series_key>.json`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::types::SeriesTracker;
use super::{TrackerError, TrackerStore};

/// Stores one JSON file per series under a directory.
pub struct FileTrackerStore {
    dir: PathBuf,
}

impl FileTrackerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the tracker file for a series.
    pub fn path_for(&self, series_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", series_key))
    }

    fn temp_path_for(&self, series_key: &str) -> PathBuf {
        self.dir
            .join(format!(".{}.json.{}.tmp", series_key, uuid::Uuid::new_v4()))
    }
}

fn validate_key(series_key: &str) -> Result<(), TrackerError> {
    let valid = !series_key.is_empty()
        && series_key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TrackerError::InvalidKey(series_key.to_string()))
    }
}

#[async_trait]
impl TrackerStore for FileTrackerStore {
    async fn read(&self, series_key: &str) -> Result<SeriesTracker, TrackerError> {
        validate_key(series_key)?;
        let path = self.path_for(series_key);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No tracker file for '{}', starting empty", series_key);
                return Ok(SeriesTracker::new());
            }
            Err(e) => return Err(TrackerError::Io { path, source: e }),
        };

        match serde_json::from_str::<SeriesTracker>(&content) {
            Ok(tracker) => Ok(tracker),
            Err(e) => {
                warn!(
                    "Malformed tracker file {}, treating as empty: {}",
                    path.display(),
                    e
                );
                Ok(SeriesTracker::new())
            }
        }
    }

    async fn write(&self, series_key: &str, tracker: &SeriesTracker) -> Result<(), TrackerError> {
        validate_key(series_key)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TrackerError::Io {
                path: self.dir.clone(),
                source: e,
            })?;

        let json = serde_json::to_string_pretty(tracker)?;
        let path = self.path_for(series_key);
        let temp = self.temp_path_for(series_key);

        if let Err(e) = fs::write(&temp, json.as_bytes()).await {
            let _ = fs::remove_file(&temp).await;
            return Err(TrackerError::Io {
                path: temp,
                source: e,
            });
        }

        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(TrackerError::Io { path, source: e });
        }

        debug!("Wrote tracker {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{season_key, SeasonTrackerRecord};
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileTrackerStore::new(dir.path());

        let tracker = store.read("breaking-bad").await.unwrap();
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileTrackerStore::new(dir.path());
        std::fs::write(store.path_for("breaking-bad"), "{ not json").unwrap();

        let tracker = store.read("breaking-bad").await.unwrap();
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileTrackerStore::new(dir.path().join("tracker"));

        let mut record = SeasonTrackerRecord::empty();
        record.commit_disc(Some(1), "S1D1", 4, Utc::now());
        let mut tracker = SeriesTracker::new();
        tracker.insert(season_key(1), record.clone());

        store.write("breaking-bad", &tracker).await.unwrap();
        let loaded = store.read("breaking-bad").await.unwrap();

        assert_eq!(loaded.get("season1"), Some(&record));

        // No temp files left behind.
        let entries: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["breaking-bad.json".to_string()]);
    }

    #[tokio::test]
    async fn test_file_layout_is_keyed_by_season() {
        let dir = TempDir::new().unwrap();
        let store = FileTrackerStore::new(dir.path());

        let mut tracker = SeriesTracker::new();
        tracker.insert(season_key(2), SeasonTrackerRecord::empty());
        store.write("show", &tracker).await.unwrap();

        let raw = std::fs::read_to_string(store.path_for("show")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("season2").is_some());
        assert_eq!(value["season2"]["last_episode"], 0);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileTrackerStore::new(dir.path());

        let result = store.read("../escape").await;
        assert!(matches!(result, Err(TrackerError::InvalidKey(_))));
    }
}
