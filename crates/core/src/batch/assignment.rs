//! Sequential episode-range pre-calculation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::types::{DiscJob, EpisodeAssignment, EpisodeSlot};
use crate::catalog::SeriesEpisodeCatalog;
use crate::tracker::{season_record, SeriesTracker};

/// Target file name for one episode.
pub fn episode_file_name(series_name: &str, season: u32, episode: u32) -> String {
    format!("{} - S{:02}E{:02}.mkv", series_name, season, episode)
}

/// Output path of one episode, relative to the library root.
pub fn episode_relative_path(series_name: &str, season: u32, episode: u32) -> PathBuf {
    PathBuf::from(series_name)
        .join(format!("Season {:02}", season))
        .join(episode_file_name(series_name, season, episode))
}

/// Assign a non-overlapping episode range to every processable disc.
///
/// Per season, discs are walked in increasing disc-number order from
/// `last_episode + 1`. The tracker cursor alone decides the start; a disc's
/// detected start is never used, so the union of ranges stays a gap-free run.
/// Runs to completion before any export starts.
pub fn assign(
    processable: &[DiscJob],
    tracker: &SeriesTracker,
    catalog: Option<&SeriesEpisodeCatalog>,
) -> BTreeMap<String, EpisodeAssignment> {
    let mut by_season: BTreeMap<u32, Vec<&DiscJob>> = BTreeMap::new();
    for disc in processable {
        by_season.entry(disc.season).or_default().push(disc);
    }

    let mut assignments = BTreeMap::new();

    for (season, mut discs) in by_season {
        discs.sort_by(|a, b| {
            a.disc_number
                .cmp(&b.disc_number)
                .then_with(|| a.name.cmp(&b.name))
        });

        let record = season_record(tracker, season);
        let mut cursor = record.last_episode + 1;
        let season_entry = catalog.and_then(|c| c.season(season));

        for disc in discs {
            let count = disc.episode_count();
            if count == 0 {
                warn!("Disc '{}' has no episodes, not assigning", disc.name);
                continue;
            }

            if disc.correlation.start_episode > cursor {
                debug!(
                    "Disc '{}' detected start E{} ignored, continuing at E{}",
                    disc.name, disc.correlation.start_episode, cursor
                );
            }
            let start = cursor;
            let end = start + count - 1;
            cursor = end + 1;

            if let Some(expected) = season_entry.map(|s| s.episode_count) {
                if end > expected {
                    warn!(
                        "Disc '{}' assigned E{}-E{} but season {} lists {} episodes",
                        disc.name, start, end, season, expected
                    );
                }
            }

            let episodes = disc
                .extraction
                .titles
                .iter()
                .zip(start..=end)
                .map(|(title, episode)| EpisodeSlot {
                    episode,
                    title_index: title.title_index,
                    duration_secs: title.duration_secs,
                    file_name: episode_file_name(&disc.series_name, season, episode),
                    relative_path: episode_relative_path(&disc.series_name, season, episode),
                })
                .collect();

            debug!(
                "Assigned disc '{}' to S{:02}E{:02}-E{:02}",
                disc.name, season, start, end
            );

            assignments.insert(
                disc.name.clone(),
                EpisodeAssignment {
                    disc_name: disc.name.clone(),
                    disc_number: disc.disc_number,
                    season,
                    season_name: season_entry.and_then(|s| s.name.clone()),
                    start_episode: start,
                    end_episode: end,
                    episodes,
                },
            );
        }
    }

    assignments
}
