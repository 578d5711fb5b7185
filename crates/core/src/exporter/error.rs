//! Error types for remux and transfer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while remuxing a title.
#[derive(Debug, Error)]
pub enum RemuxError {
    /// Remuxer binary not found.
    #[error("Remuxer binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Disc path does not exist.
    #[error("Disc not found: {path}")]
    DiscNotFound { path: PathBuf },

    /// Remux process failed.
    #[error("Remux failed: {reason}")]
    RemuxFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The remuxer exited cleanly but produced no file.
    #[error("No output file produced in {dir}")]
    OutputMissing { dir: PathBuf },

    /// Remux timed out.
    #[error("Remux timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemuxError {
    pub fn remux_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::RemuxFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

/// Errors that can occur while transferring a file to its destination.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Destination already exists and overwrite is disabled.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Checksum verification failed.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::CopyFailed { .. } | Self::ChecksumMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RemuxError::Timeout { timeout_secs: 10 }.is_retryable());
        assert!(!RemuxError::remux_failed("bad title", None).is_retryable());
        assert!(!RemuxError::BinaryNotFound {
            path: PathBuf::from("makemkvcon")
        }
        .is_retryable());

        assert!(TransferError::ChecksumMismatch {
            path: PathBuf::from("/x"),
            expected: "a".into(),
            actual: "b".into(),
        }
        .is_retryable());
        assert!(!TransferError::DestinationExists {
            path: PathBuf::from("/x")
        }
        .is_retryable());
    }
}
