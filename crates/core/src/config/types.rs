use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::catalog::TmdbConfig;
use crate::disc::ScannerConfig;
use crate::exporter::{RemuxerConfig, TransferConfig};
use crate::scheduler::SchedulerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub remuxer: RemuxerConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Directory layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Backups as `<watch_dir>/<Series>/<disc folder or image>`.
    pub watch_dir: PathBuf,
    /// Library root; episodes land in `<Series>/Season NN/`.
    pub output_dir: PathBuf,
    /// Scratch space for remux output before transfer.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("discsync")
}

/// Per-series tracker storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_dir")]
    pub dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dir: default_tracker_dir(),
        }
    }
}

fn default_tracker_dir() -> PathBuf {
    PathBuf::from("tracker")
}

/// Episode catalog sources. Without one, correlation uses its fallback.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub tracker: TrackerConfig,
    pub scheduler: SchedulerConfig,
    pub scanner: ScannerConfig,
    pub remuxer: RemuxerConfig,
    pub transfer: TransferConfig,
    pub catalog: SanitizedCatalogConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<SanitizedTmdbConfig>,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            library: config.library.clone(),
            tracker: config.tracker.clone(),
            scheduler: config.scheduler.clone(),
            scanner: config.scanner.clone(),
            remuxer: config.remuxer.clone(),
            transfer: config.transfer.clone(),
            catalog: SanitizedCatalogConfig {
                tmdb: config.catalog.tmdb.as_ref().map(|t| SanitizedTmdbConfig {
                    base_url: t.base_url.clone(),
                    api_key_configured: !t.api_key.is_empty(),
                    timeout_secs: t.timeout_secs,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[library]
watch_dir = "/backups"
output_dir = "/media/tv"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.library.watch_dir, PathBuf::from("/backups"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.tracker.dir, PathBuf::from("tracker"));
        assert_eq!(config.scheduler.max_parallel_exports, 3);
        assert_eq!(config.scanner.min_episode_minutes, 15);
        assert!(config.transfer.verify_checksums);
        assert!(config.catalog.tmdb.is_none());
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[library]
watch_dir = "/backups"
output_dir = "/media/tv"
temp_dir = "/scratch"

[tracker]
dir = "/var/lib/discsync"

[scheduler]
poll_interval_secs = 120
max_parallel_exports = 2
auto_export_min_confidence = 0.8

[scanner]
min_episode_minutes = 20
max_episode_minutes = 70

[catalog.tmdb]
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.library.temp_dir, PathBuf::from("/scratch"));
        assert_eq!(config.tracker.dir, PathBuf::from("/var/lib/discsync"));
        assert_eq!(config.scheduler.max_parallel_exports, 2);
        assert_eq!(config.scanner.max_episode_minutes, 70);

        let tmdb = config.catalog.tmdb.as_ref().unwrap();
        assert_eq!(tmdb.api_key, "secret");
        assert_eq!(tmdb.timeout_secs, 30);
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.catalog.tmdb = Some(TmdbConfig {
            api_key: "secret-key".to_string(),
            base_url: None,
            timeout_secs: 10,
        });

        let sanitized = SanitizedConfig::from(&config);
        let tmdb = sanitized.catalog.tmdb.as_ref().unwrap();
        assert!(tmdb.api_key_configured);
        assert_eq!(tmdb.timeout_secs, 10);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }
}
