//! Filesystem transfer to local or mounted destinations.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};

use super::config::TransferConfig;
use super::error::TransferError;
use super::Transfer;

/// Moves remuxed files into the library.
///
/// Same-filesystem moves are a rename. Cross-device moves copy into a
/// `.partial` sibling, verify its SHA-256 against the source and rename it
/// into place, so a destination path only ever holds a complete file.
pub struct FsTransfer {
    config: TransferConfig,
}

impl FsTransfer {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TransferConfig::default())
    }

    /// Attempts to move a file atomically (rename).
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // EXDEV is 18 on Linux
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file, returning the SHA-256 of what was read.
    async fn copy_with_checksum(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<String, TransferError> {
        let copy_err = |e: std::io::Error| {
            TransferError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        };

        let source_file = File::open(source).await.map_err(copy_err)?;
        let dest_file = File::create(destination).await.map_err(copy_err)?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(copy_err)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            writer
                .write_all(&buffer[..bytes_read])
                .await
                .map_err(copy_err)?;
        }

        writer.flush().await.map_err(copy_err)?;
        writer.get_mut().sync_all().await.map_err(copy_err)?;

        Ok(format!("{:x}", hasher.finalize()))
    }

    async fn checksum(&self, path: &Path) -> Result<String, TransferError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    async fn copy_across_devices(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), TransferError> {
        let partial = partial_path(destination);
        let result = self.copy_verified(source, destination, &partial).await;
        if result.is_err() {
            let _ = fs::remove_file(&partial).await;
        }
        result
    }

    async fn copy_verified(
        &self,
        source: &Path,
        destination: &Path,
        partial: &Path,
    ) -> Result<(), TransferError> {
        let expected = self.copy_with_checksum(source, partial).await?;

        if self.config.verify_checksums {
            let actual = self.checksum(partial).await?;
            if actual != expected {
                return Err(TransferError::ChecksumMismatch {
                    path: destination.to_path_buf(),
                    expected,
                    actual,
                });
            }
        }

        fs::rename(partial, destination).await?;

        if let Err(e) = fs::remove_file(source).await {
            warn!("Failed to remove source file {}: {}", source.display(), e);
        }
        Ok(())
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}

#[async_trait]
impl Transfer for FsTransfer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn transfer(&self, local_path: &Path, destination: &Path) -> Result<PathBuf, TransferError> {
        if !local_path.exists() {
            return Err(TransferError::SourceNotFound {
                path: local_path.to_path_buf(),
            });
        }

        if destination.exists() && !self.config.overwrite {
            return Err(TransferError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        if Self::try_atomic_move(local_path, destination).await? {
            debug!(
                "Moved {} to {}",
                local_path.display(),
                destination.display()
            );
        } else {
            debug!(
                "Cross-device copy {} to {}",
                local_path.display(),
                destination.display()
            );
            self.copy_across_devices(local_path, destination).await?;
        }

        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_transfer_moves_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("title_t00.mkv");
        std::fs::write(&source, b"episode data").unwrap();
        let dest = dir.path().join("Show/Season 01/Show - S01E01.mkv");

        let transfer = FsTransfer::with_defaults();
        let placed = transfer.transfer(&source, &dest).await.unwrap();

        assert_eq!(placed, dest);
        assert!(!source.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"episode data");
    }

    #[tokio::test]
    async fn test_transfer_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.mkv");
        let dest = dir.path().join("b.mkv");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&dest, b"old").unwrap();

        let transfer = FsTransfer::with_defaults();
        let result = transfer.transfer(&source, &dest).await;
        assert!(matches!(result, Err(TransferError::DestinationExists { .. })));
        assert!(source.exists());

        let transfer = FsTransfer::new(TransferConfig::default().with_overwrite(true));
        transfer.transfer(&source, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_transfer_missing_source() {
        let dir = TempDir::new().unwrap();
        let transfer = FsTransfer::with_defaults();
        let result = transfer
            .transfer(&dir.path().join("missing.mkv"), &dir.path().join("out.mkv"))
            .await;
        assert!(matches!(result, Err(TransferError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_copy_across_devices_verifies_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("title.mkv");
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&source, &data).unwrap();
        let dest = dir.path().join("dest.mkv");

        let transfer = FsTransfer::new(TransferConfig::default().with_buffer_size(4096));
        transfer.copy_across_devices(&source, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), data);
        assert!(!source.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/lib/Show - S01E01.mkv")),
            PathBuf::from("/lib/Show - S01E01.mkv.partial")
        );
    }
}
