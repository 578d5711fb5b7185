//! MakeMKV-based disc scanner.
//!
//! Runs `makemkvcon -r info <source>` and reads the title table out of the
//! robot-mode output. Only the `TINFO` attributes for chapter count (8) and
//! duration (9) are used.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ScannerConfig;
use super::types::TitleInfo;
use super::{DiscScanner, ScannerError};

const ATTR_CHAPTER_COUNT: u32 = 8;
const ATTR_DURATION: u32 = 9;

static TINFO_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^TINFO:(\d+),(\d+),\d+,"(.*)"$"#).expect("valid TINFO pattern")
});

/// Builds the makemkvcon source argument for a disc folder or image.
pub(crate) fn makemkv_source(path: &Path) -> String {
    let is_image = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("iso"))
        .unwrap_or(false);

    if is_image {
        format!("iso:{}", path.display())
    } else {
        format!("file:{}", path.display())
    }
}

/// Disc scanner backed by `makemkvcon`.
pub struct MakeMkvScanner {
    config: ScannerConfig,
}

impl MakeMkvScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Parses robot-mode output into a title list ordered by title index.
    pub fn parse_robot_output(output: &str) -> Vec<TitleInfo> {
        let mut titles: BTreeMap<u32, TitleInfo> = BTreeMap::new();

        for line in output.lines() {
            let Some(caps) = TINFO_LINE.captures(line.trim()) else {
                continue;
            };
            let (Some(idx), Some(attr), Some(value)) = (
                caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()),
                caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()),
                caps.get(3).map(|m| m.as_str()),
            ) else {
                continue;
            };

            let entry = titles.entry(idx).or_insert(TitleInfo {
                title_index: idx,
                duration_secs: 0,
                chapter_count: 0,
            });

            match attr {
                ATTR_CHAPTER_COUNT => entry.chapter_count = value.parse().unwrap_or(0),
                ATTR_DURATION => entry.duration_secs = parse_duration(value).unwrap_or(0),
                _ => {}
            }
        }

        titles.into_values().collect()
    }
}

/// Parses `h:mm:ss` (or `mm:ss`) into seconds.
fn parse_duration(value: &str) -> Option<u64> {
    let mut secs = 0u64;
    for part in value.split(':') {
        secs = secs * 60 + part.trim().parse::<u64>().ok()?;
    }
    Some(secs)
}

#[async_trait]
impl DiscScanner for MakeMkvScanner {
    fn name(&self) -> &str {
        "makemkv"
    }

    async fn scan(&self, disc_path: &Path) -> Result<Vec<TitleInfo>, ScannerError> {
        if !disc_path.exists() {
            return Err(ScannerError::DiscNotFound {
                path: disc_path.to_path_buf(),
            });
        }

        let source = makemkv_source(disc_path);
        debug!("Scanning disc {} via {:?}", source, self.config.makemkvcon_path);

        let child = Command::new(&self.config.makemkvcon_path)
            .args(["-r", "--noscan", "info", &source])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScannerError::BinaryNotFound {
                        path: self.config.makemkvcon_path.clone(),
                    }
                } else {
                    ScannerError::Io(e)
                }
            })?;

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ScannerError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ScannerError::ScanFailed {
                reason: format!("makemkvcon exited with code: {:?}", output.status.code()),
                stderr: if stderr.is_empty() { None } else { Some(stderr) },
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let titles = Self::parse_robot_output(&stdout);
        debug!("Disc {} has {} titles", disc_path.display(), titles.len());
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"MSG:1005,0,1,"MakeMKV v1.17.5 linux(x64-release) started","%1 started","MakeMKV v1.17.5 linux(x64-release)"
TCOUNT:3
TINFO:0,2,0,"SHOW_S1D2"
TINFO:0,8,0,"7"
TINFO:0,9,0,"0:43:51"
TINFO:1,8,0,"6"
TINFO:1,9,0,"0:42:07"
TINFO:2,8,0,"1"
TINFO:2,9,0,"0:01:30"
SINFO:0,0,1,6201,"Video""#;

    #[test]
    fn test_parse_robot_output() {
        let titles = MakeMkvScanner::parse_robot_output(SAMPLE);
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[0].title_index, 0);
        assert_eq!(titles[0].duration_secs, 43 * 60 + 51);
        assert_eq!(titles[0].chapter_count, 7);
        assert_eq!(titles[2].duration_secs, 90);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1:02:03"), Some(3723));
        assert_eq!(parse_duration("42:00"), Some(2520));
        assert_eq!(parse_duration("abc"), None);
    }

    #[test]
    fn test_makemkv_source() {
        assert_eq!(
            makemkv_source(&PathBuf::from("/discs/Show/S1D1.ISO")),
            "iso:/discs/Show/S1D1.ISO"
        );
        assert_eq!(
            makemkv_source(&PathBuf::from("/discs/Show/S1D1")),
            "file:/discs/Show/S1D1"
        );
    }

    #[tokio::test]
    async fn test_scan_missing_disc() {
        let scanner = MakeMkvScanner::new(ScannerConfig::default());
        let result = scanner.scan(Path::new("/nonexistent/disc")).await;
        assert!(matches!(result, Err(ScannerError::DiscNotFound { .. })));
    }
}
