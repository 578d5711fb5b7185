//! Remux and transfer configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::disc::default_makemkvcon_path;

/// Configuration for the MakeMKV remuxer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemuxerConfig {
    /// Path to the makemkvcon binary.
    #[serde(default = "default_makemkvcon_path")]
    pub makemkvcon_path: PathBuf,

    /// Timeout for remuxing a single title.
    #[serde(default = "default_remux_timeout")]
    pub timeout_secs: u64,
}

fn default_remux_timeout() -> u64 {
    7200 // 2 hours
}

impl Default for RemuxerConfig {
    fn default() -> Self {
        Self {
            makemkvcon_path: default_makemkvcon_path(),
            timeout_secs: default_remux_timeout(),
        }
    }
}

/// Configuration for the filesystem transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Re-read and hash the destination after a cross-device copy.
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// Replace an existing destination file.
    #[serde(default)]
    pub overwrite: bool,
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            verify_checksums: true,
            overwrite: false,
        }
    }
}

impl TransferConfig {
    pub fn with_verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}
