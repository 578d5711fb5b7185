//! Normalized series episode catalog.

use serde::{Deserialize, Serialize};

/// One regular season of a series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonEntry {
    /// Season number (never 0; specials are dropped during normalization).
    pub season: u32,
    /// Number of episodes in the season.
    pub episode_count: u32,
    /// Season name, e.g. "Season 2".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Air date of the first episode (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
}

/// Season/episode-count listing for one series.
///
/// Built once from an external source and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesEpisodeCatalog {
    pub series_name: String,
    pub total_seasons: u32,
    /// Regular seasons ordered by season number.
    pub seasons: Vec<SeasonEntry>,
}

impl SeriesEpisodeCatalog {
    /// Build a catalog, dropping specials (season 0) and ordering by season.
    pub fn new(series_name: impl Into<String>, seasons: Vec<SeasonEntry>) -> Self {
        let mut seasons: Vec<SeasonEntry> =
            seasons.into_iter().filter(|s| s.season > 0).collect();
        seasons.sort_by_key(|s| s.season);
        seasons.dedup_by_key(|s| s.season);

        Self {
            series_name: series_name.into(),
            total_seasons: seasons.len() as u32,
            seasons,
        }
    }

    /// Convenience constructor from `(season, episode_count)` pairs.
    pub fn from_counts(series_name: impl Into<String>, counts: &[(u32, u32)]) -> Self {
        Self::new(
            series_name,
            counts
                .iter()
                .map(|&(season, episode_count)| SeasonEntry {
                    season,
                    episode_count,
                    name: None,
                    air_date: None,
                })
                .collect(),
        )
    }

    /// Look up a season.
    pub fn season(&self, season: u32) -> Option<&SeasonEntry> {
        self.seasons.iter().find(|s| s.season == season)
    }

    /// Episode count of a season, if cataloged.
    pub fn episode_count(&self, season: u32) -> Option<u32> {
        self.season(season).map(|s| s.episode_count)
    }

    /// Seasons whose episode count equals `count`, in ascending season order.
    pub fn seasons_with_episode_count(&self, count: u32) -> Vec<u32> {
        self.seasons
            .iter()
            .filter(|s| s.episode_count == count)
            .map(|s| s.season)
            .collect()
    }

    /// Whether `season` lies between the lowest and highest cataloged season.
    pub fn season_in_range(&self, season: u32) -> bool {
        match (self.seasons.first(), self.seasons.last()) {
            (Some(first), Some(last)) => season >= first.season && season <= last.season,
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}
