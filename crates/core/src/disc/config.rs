//! Disc scanner configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::EpisodeDurationRange;

/// Configuration for disc scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Path to the makemkvcon binary.
    #[serde(default = "default_makemkvcon_path")]
    pub makemkvcon_path: PathBuf,

    /// Scan timeout in seconds.
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,

    /// Shortest title (minutes) still considered an episode.
    #[serde(default = "default_min_episode_minutes")]
    pub min_episode_minutes: u64,

    /// Longest title (minutes) still considered an episode.
    #[serde(default = "default_max_episode_minutes")]
    pub max_episode_minutes: u64,
}

pub(crate) fn default_makemkvcon_path() -> PathBuf {
    PathBuf::from("makemkvcon")
}

fn default_scan_timeout() -> u64 {
    600 // 10 minutes
}

fn default_min_episode_minutes() -> u64 {
    15
}

fn default_max_episode_minutes() -> u64 {
    90
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            makemkvcon_path: default_makemkvcon_path(),
            timeout_secs: default_scan_timeout(),
            min_episode_minutes: default_min_episode_minutes(),
            max_episode_minutes: default_max_episode_minutes(),
        }
    }
}

impl ScannerConfig {
    /// Episode duration window derived from the configured bounds.
    pub fn episode_range(&self) -> EpisodeDurationRange {
        EpisodeDurationRange::from_minutes(self.min_episode_minutes, self.max_episode_minutes)
    }
}
