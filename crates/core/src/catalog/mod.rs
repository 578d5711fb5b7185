//! Series episode catalog.
//!
//! Wraps an external season/episode-count lookup (TMDB) and normalizes it into
//! an ordered list of `(season, episode_count)` entries used by the
//! correlation engine.

mod tmdb;
mod types;

pub use tmdb::{TmdbCatalogSource, TmdbConfig};
pub use types::{SeasonEntry, SeriesEpisodeCatalog};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when looking up a series catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Series not found.
    #[error("Series not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Source not configured (missing API key, etc.).
    #[error("Catalog source not configured: {0}")]
    NotConfigured(String),
}

/// A source of season/episode counts for a series.
#[async_trait]
pub trait EpisodeCatalogSource: Send + Sync {
    /// Name of this source, for logging.
    fn name(&self) -> &str;

    /// Look up the catalog for a series by name.
    async fn lookup(&self, series_name: &str) -> Result<SeriesEpisodeCatalog, CatalogError>;
}
