//! Types for disc scanning and episode extraction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::volume_label::VolumeLabelHint;

/// A title as reported by a disc scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleInfo {
    /// Title index on the disc (as understood by the remuxer).
    pub title_index: u32,
    /// Playback duration in seconds.
    pub duration_secs: u64,
    /// Number of chapters.
    pub chapter_count: u32,
}

/// A title that passed the episode-duration filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub title_index: u32,
    pub duration_secs: u64,
    pub chapter_count: u32,
}

impl From<&TitleInfo> for TitleSummary {
    fn from(t: &TitleInfo) -> Self {
        Self {
            title_index: t.title_index,
            duration_secs: t.duration_secs,
            chapter_count: t.chapter_count,
        }
    }
}

/// Episode-length titles found on one disc.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscEpisodeExtraction {
    pub episode_count: u32,
    /// Titles ordered by title index.
    pub titles: Vec<TitleSummary>,
}

/// Duration window a title must fall into to count as an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeDurationRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl EpisodeDurationRange {
    pub fn from_minutes(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_secs: min_minutes * 60,
            max_secs: max_minutes * 60,
        }
    }

    pub fn contains(&self, duration_secs: u64) -> bool {
        duration_secs >= self.min_secs && duration_secs <= self.max_secs
    }
}

impl Default for EpisodeDurationRange {
    fn default() -> Self {
        Self::from_minutes(15, 90)
    }
}

/// Filter a raw title list down to episode-length titles.
pub fn extract_episodes(titles: &[TitleInfo], range: EpisodeDurationRange) -> DiscEpisodeExtraction {
    let mut episodes: Vec<TitleSummary> = titles
        .iter()
        .filter(|t| range.contains(t.duration_secs))
        .map(TitleSummary::from)
        .collect();
    episodes.sort_by_key(|t| t.title_index);

    DiscEpisodeExtraction {
        episode_count: episodes.len() as u32,
        titles: episodes,
    }
}

/// A disc image found in the watch directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDisc {
    /// Series key the disc belongs to (see [`series_key`](super::series_key)).
    pub series_key: String,
    /// Series display name (the parent directory name).
    pub series_name: String,
    /// Disc name (directory name, or file stem for images). Doubles as label text.
    pub name: String,
    /// Path to the disc folder or image file.
    pub path: PathBuf,
    /// Hints parsed from the label.
    pub hint: VolumeLabelHint,
}
