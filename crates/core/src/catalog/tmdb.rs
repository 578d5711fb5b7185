//! TMDB (The Movie Database) catalog source.
//!
//! TMDB requires an API key. A lookup searches TV series by name, takes the
//! best hit and fetches its season list.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{SeasonEntry, SeriesEpisodeCatalog};
use super::{CatalogError, EpisodeCatalogSource};

/// TMDB source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

/// TMDB-backed episode catalog source.
pub struct TmdbCatalogSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbCatalogSource {
    /// Create a new TMDB source.
    pub fn new(config: TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbTvResult>, CatalogError> {
        let url = format!("{}/search/tv", self.base_url);

        debug!("TMDB TV search: query='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?;

        let response = check_status(response, query).await?;
        let search: TmdbSearchResponse<TmdbTvResult> = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse TV search response: {}", e))
        })?;

        Ok(search.results)
    }

    async fn get_tv(&self, tmdb_id: u32) -> Result<TmdbTvDetails, CatalogError> {
        let url = format!("{}/tv/{}", self.base_url, tmdb_id);

        debug!("TMDB get TV: id={}", tmdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let response = check_status(response, &format!("TV series ID {}", tmdb_id)).await?;
        response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse TV response: {}", e))
        })
    }
}

#[async_trait]
impl EpisodeCatalogSource for TmdbCatalogSource {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn lookup(&self, series_name: &str) -> Result<SeriesEpisodeCatalog, CatalogError> {
        let results = self.search_tv(series_name).await?;
        let best = results
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(series_name.to_string()))?;

        let details = self.get_tv(best.id).await?;
        Ok(details.into())
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, CatalogError> {
    let status = response.status();
    if status == 401 {
        return Err(CatalogError::NotConfigured(
            "Invalid TMDB API key".to_string(),
        ));
    }
    if status == 404 {
        return Err(CatalogError::NotFound(what.to_string()));
    }
    if status == 429 {
        return Err(CatalogError::RateLimitExceeded);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetails {
    name: String,
    #[serde(default)]
    seasons: Vec<TmdbSeasonResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonResult {
    season_number: u32,
    name: Option<String>,
    episode_count: Option<u32>,
    air_date: Option<String>,
}

impl From<TmdbTvDetails> for SeriesEpisodeCatalog {
    fn from(d: TmdbTvDetails) -> Self {
        SeriesEpisodeCatalog::new(
            d.name,
            d.seasons
                .into_iter()
                .map(|s| SeasonEntry {
                    season: s.season_number,
                    episode_count: s.episode_count.unwrap_or(0),
                    name: s.name,
                    air_date: s.air_date,
                })
                .collect(),
        )
    }
}
