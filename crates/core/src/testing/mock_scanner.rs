//! Mock disc scanner for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::disc::{DiscScanner, ScannerError, TitleInfo};

use super::fixtures::episode_titles;

/// Mock implementation of the DiscScanner trait.
///
/// Titles are keyed by disc name (the last path component). Unknown discs
/// scan as empty.
#[derive(Debug, Default)]
pub struct MockDiscScanner {
    titles: Arc<RwLock<HashMap<String, Vec<TitleInfo>>>>,
    /// Discs whose scan fails.
    failing: Arc<RwLock<HashMap<String, String>>>,
    scan_count: AtomicUsize,
}

impl MockDiscScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw title list of a disc.
    pub async fn set_titles(&self, disc_name: &str, titles: Vec<TitleInfo>) {
        self.titles
            .write()
            .await
            .insert(disc_name.to_string(), titles);
    }

    /// Give a disc `count` episode titles plus a long play-all title.
    pub async fn set_episode_titles(&self, disc_name: &str, count: u32, minutes: u64) {
        let mut titles = episode_titles(count, minutes);
        titles.push(TitleInfo {
            title_index: count,
            duration_secs: minutes * 60 * count as u64 + 600,
            chapter_count: 6 * count,
        });
        self.set_titles(disc_name, titles).await;
    }

    /// Make scans of a disc fail.
    pub async fn fail_disc(&self, disc_name: &str, reason: &str) {
        self.failing
            .write()
            .await
            .insert(disc_name.to_string(), reason.to_string());
    }

    /// Number of scans performed, cached results excluded.
    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscScanner for MockDiscScanner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn scan(&self, disc_path: &Path) -> Result<Vec<TitleInfo>, ScannerError> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);

        let name = disc_path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(reason) = self.failing.read().await.get(&name) {
            return Err(ScannerError::ScanFailed {
                reason: reason.clone(),
                stderr: None,
            });
        }

        Ok(self
            .titles
            .read()
            .await
            .get(&name)
            .cloned()
            .unwrap_or_default())
    }
}
