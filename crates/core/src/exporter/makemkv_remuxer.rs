//! MakeMKV-based remuxer.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::RemuxerConfig;
use super::error::RemuxError;
use super::Remuxer;
use crate::disc::makemkv_source;

/// Lossless remuxer backed by `makemkvcon mkv`.
pub struct MakeMkvRemuxer {
    config: RemuxerConfig,
}

impl MakeMkvRemuxer {
    pub fn new(config: RemuxerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RemuxerConfig::default())
    }

    fn build_args(disc_path: &Path, title_index: u32, output_dir: &Path) -> Vec<String> {
        vec![
            "-r".to_string(),
            "--noscan".to_string(),
            "mkv".to_string(),
            makemkv_source(disc_path),
            title_index.to_string(),
            output_dir.to_string_lossy().to_string(),
        ]
    }

    /// The output directory is exclusive to one title, so the first `.mkv`
    /// found is the result.
    async fn find_output(output_dir: &Path) -> Result<PathBuf, RemuxError> {
        let mut entries = fs::read_dir(output_dir).await?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_mkv = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("mkv"))
                .unwrap_or(false);
            if is_mkv {
                found.push(path);
            }
        }
        found.sort();
        found
            .into_iter()
            .next()
            .ok_or_else(|| RemuxError::OutputMissing {
                dir: output_dir.to_path_buf(),
            })
    }
}

#[async_trait]
impl Remuxer for MakeMkvRemuxer {
    fn name(&self) -> &str {
        "makemkv"
    }

    async fn remux(
        &self,
        disc_path: &Path,
        title_index: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, RemuxError> {
        if !disc_path.exists() {
            return Err(RemuxError::DiscNotFound {
                path: disc_path.to_path_buf(),
            });
        }

        fs::create_dir_all(output_dir).await?;

        let args = Self::build_args(disc_path, title_index, output_dir);
        debug!("Running makemkvcon {:?}", args);

        let child = Command::new(&self.config.makemkvcon_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RemuxError::BinaryNotFound {
                        path: self.config.makemkvcon_path.clone(),
                    }
                } else {
                    RemuxError::Io(e)
                }
            })?;

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| RemuxError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(RemuxError::remux_failed(
                format!("makemkvcon exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        let path = Self::find_output(output_dir).await?;
        debug!(
            "Remuxed title {} of {} to {}",
            title_index,
            disc_path.display(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_args() {
        let args = MakeMkvRemuxer::build_args(
            Path::new("/discs/Show/S1D1.iso"),
            3,
            Path::new("/tmp/out"),
        );
        assert_eq!(
            args,
            vec!["-r", "--noscan", "mkv", "iso:/discs/Show/S1D1.iso", "3", "/tmp/out"]
        );
    }

    #[tokio::test]
    async fn test_find_output() {
        let dir = TempDir::new().unwrap();
        let result = MakeMkvRemuxer::find_output(dir.path()).await;
        assert!(matches!(result, Err(RemuxError::OutputMissing { .. })));

        std::fs::write(dir.path().join("title_t03.mkv"), b"data").unwrap();
        std::fs::write(dir.path().join("log.txt"), b"").unwrap();
        let path = MakeMkvRemuxer::find_output(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("title_t03.mkv"));
    }

    #[tokio::test]
    async fn test_remux_missing_disc() {
        let dir = TempDir::new().unwrap();
        let remuxer = MakeMkvRemuxer::with_defaults();
        let result = remuxer
            .remux(Path::new("/nonexistent/disc"), 0, dir.path())
            .await;
        assert!(matches!(result, Err(RemuxError::DiscNotFound { .. })));
    }
}
