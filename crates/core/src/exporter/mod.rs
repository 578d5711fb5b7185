//! Remux and transfer collaborators used by export jobs.

mod config;
mod error;
mod fs_transfer;
mod makemkv_remuxer;

pub use config::{RemuxerConfig, TransferConfig};
pub use error::{RemuxError, TransferError};
pub use fs_transfer::FsTransfer;
pub use makemkv_remuxer::MakeMkvRemuxer;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Lossless remux of one disc title into a local file.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Returns the name of this remuxer implementation.
    fn name(&self) -> &str;

    /// Remux `title_index` of the disc into `output_dir`, returning the file.
    ///
    /// `output_dir` is exclusive to this call.
    async fn remux(
        &self,
        disc_path: &Path,
        title_index: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, RemuxError>;
}

/// Moves a finished file to its final destination.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Returns the name of this transfer implementation.
    fn name(&self) -> &str;

    async fn transfer(&self, local_path: &Path, destination: &Path)
        -> Result<PathBuf, TransferError>;
}
