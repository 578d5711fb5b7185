//! Mock remuxer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::exporter::{RemuxError, Remuxer};

/// A recorded remux call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRemux {
    pub disc_path: PathBuf,
    pub title_index: u32,
    pub success: bool,
}

/// Mock implementation of the Remuxer trait.
///
/// Writes a small `title_tNN.mkv` file into the output directory whose
/// content names the disc and title, so placed episodes can be traced back.
/// Tracks peak concurrency for parallelism assertions.
#[derive(Debug, Default)]
pub struct MockRemuxer {
    calls: Arc<RwLock<Vec<RecordedRemux>>>,
    /// If set, the next remux will fail with this error.
    next_error: Arc<RwLock<Option<RemuxError>>>,
    /// Discs (by name) whose every remux fails permanently.
    failing_discs: Arc<RwLock<HashSet<String>>>,
    /// Discs (by name) whose remux panics, as a crashed task would.
    panicking_discs: Arc<RwLock<HashSet<String>>>,
    delay_ms: Arc<RwLock<u64>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockRemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded remux calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedRemux> {
        self.calls.read().await.clone()
    }

    /// Number of remux calls that succeeded.
    pub async fn success_count(&self) -> usize {
        self.calls.read().await.iter().filter(|c| c.success).count()
    }

    /// Configure the next remux to fail with the given error.
    pub async fn set_next_error(&self, error: RemuxError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every remux of a disc fail.
    pub async fn fail_disc(&self, disc_name: &str) {
        self.failing_discs
            .write()
            .await
            .insert(disc_name.to_string());
    }

    /// Make every remux of a disc panic.
    pub async fn panic_on_disc(&self, disc_name: &str) {
        self.panicking_discs
            .write()
            .await
            .insert(disc_name.to_string());
    }

    /// Let previously failing or panicking discs succeed again.
    pub async fn clear_failures(&self) {
        self.failing_discs.write().await.clear();
        self.panicking_discs.write().await.clear();
    }

    /// Simulated remux duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Highest number of remuxes observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn run(
        &self,
        disc_path: &Path,
        title_index: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, RemuxError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let disc_name = disc_path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.panicking_discs.read().await.contains(&disc_name) {
            panic!("mock remux panic for {}", disc_name);
        }
        if self.failing_discs.read().await.contains(&disc_name) {
            return Err(RemuxError::remux_failed(
                format!("mock failure for {}", disc_name),
                None,
            ));
        }

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let output = output_dir.join(format!("title_t{:02}.mkv", title_index));
        tokio::fs::write(&output, format!("{}:{}", disc_name, title_index)).await?;
        Ok(output)
    }
}

#[async_trait]
impl Remuxer for MockRemuxer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn remux(
        &self,
        disc_path: &Path,
        title_index: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, RemuxError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.run(disc_path, title_index, output_dir).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.calls.write().await.push(RecordedRemux {
            disc_path: disc_path.to_path_buf(),
            title_index,
            success: result.is_ok(),
        });
        result
    }
}
