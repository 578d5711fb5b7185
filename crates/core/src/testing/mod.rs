//! Testing utilities and mock implementations.
//!
//! Mocks for the scanner, catalog, remuxer and tracker seams let the scheduler run
//! end to end against a temporary directory tree without `makemkvcon` or
//! network access. Transfers use the real [`FsTransfer`](crate::exporter::FsTransfer).
//!
//! # Example
//!
//! ```rust,ignore
//! use discsync_core::testing::{MockCatalogSource, MockDiscScanner, MockRemuxer};
//!
//! let scanner = MockDiscScanner::new();
//! scanner.set_episode_titles("S1D1", 4, 45).await;
//!
//! let catalog = MockCatalogSource::new();
//! catalog.set_catalog(SeriesEpisodeCatalog::from_counts("Show", &[(1, 8)])).await;
//! ```

mod mock_catalog;
mod mock_remuxer;
mod mock_scanner;
mod mock_tracker;

pub use mock_catalog::MockCatalogSource;
pub use mock_remuxer::{MockRemuxer, RecordedRemux};
pub use mock_scanner::MockDiscScanner;
pub use mock_tracker::MockTrackerStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;
    use std::path::PathBuf;

    use crate::batch::DiscJob;
    use crate::correlation::{CorrelationResult, DiscSeasonMatch, Heuristic};
    use crate::disc::{DiscEpisodeExtraction, TitleInfo, TitleSummary};
    use crate::tracker::{season_key, SeasonTrackerRecord, SeriesTracker};

    /// Series name used by [`disc_job`].
    pub const TEST_SERIES: &str = "Test Show";

    /// `count` episode-length titles of `minutes` each, indexed from 0.
    pub fn episode_titles(count: u32, minutes: u64) -> Vec<TitleInfo> {
        (0..count)
            .map(|i| TitleInfo {
                title_index: i,
                duration_secs: minutes * 60,
                chapter_count: 6,
            })
            .collect()
    }

    /// A correlated disc with `episodes` titles and a high-confidence result.
    pub fn disc_job(name: &str, disc_number: Option<u32>, season: u32, episodes: u32) -> DiscJob {
        let titles: Vec<TitleSummary> = episode_titles(episodes, 45)
            .iter()
            .map(TitleSummary::from)
            .collect();

        DiscJob {
            name: name.to_string(),
            path: PathBuf::from(format!("/watch/{}/{}", TEST_SERIES, name)),
            series_key: "test-show".to_string(),
            series_name: TEST_SERIES.to_string(),
            disc_number,
            season,
            extraction: DiscEpisodeExtraction {
                episode_count: episodes,
                titles,
            },
            correlation: CorrelationResult {
                season,
                start_episode: 1,
                end_episode: episodes.max(1),
                episode_count: episodes,
                confidence: 0.95,
                correlation_reason: format!("disc number equals season {}", season),
                heuristic: Heuristic::DiscEqualsSeason(DiscSeasonMatch::Exact),
            },
        }
    }

    /// Tracker with one season record covering `discs` up to `last_episode`.
    pub fn tracker_with(season: u32, last_episode: u32, discs: &[u32]) -> SeriesTracker {
        let mut record = SeasonTrackerRecord::empty();
        record.last_episode = last_episode;
        record.processed_discs = discs.iter().copied().collect();
        record.last_disc = discs.iter().copied().max();
        record.last_exported_at = Utc::now();

        let mut tracker = SeriesTracker::new();
        tracker.insert(season_key(season), record);
        tracker
    }
}
