//! Disc scanning, episode extraction and watch-directory discovery.
//!
//! The binary disc-structure parsing itself is delegated to a scanner
//! implementation (`makemkvcon` by default) that reports a flat title list.

mod config;
mod discovery;
mod makemkv;
mod types;

pub(crate) use config::default_makemkvcon_path;
pub use config::ScannerConfig;
pub use discovery::{discover_discs, series_key};
pub use makemkv::MakeMkvScanner;
pub(crate) use makemkv::makemkv_source;
pub use types::{
    extract_episodes, DiscEpisodeExtraction, DiscoveredDisc, EpisodeDurationRange, TitleInfo,
    TitleSummary,
};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while scanning a disc.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// Scanner binary not found.
    #[error("Scanner binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Disc path does not exist.
    #[error("Disc not found: {path}")]
    DiscNotFound { path: PathBuf },

    /// Scan process failed.
    #[error("Disc scan failed: {reason}")]
    ScanFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Scan timed out.
    #[error("Disc scan timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces the title list of a disc image.
#[async_trait]
pub trait DiscScanner: Send + Sync {
    /// Returns the name of this scanner implementation.
    fn name(&self) -> &str;

    /// Scans a disc folder or image and returns all of its titles.
    async fn scan(&self, disc_path: &Path) -> Result<Vec<TitleInfo>, ScannerError>;
}
