//! Batch analysis and episode assignment types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::correlation::CorrelationResult;
use crate::disc::{DiscEpisodeExtraction, DiscoveredDisc};

/// A scanned and correlated disc, ready for batch analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscJob {
    /// Volume label; unique within a series.
    pub name: String,
    pub path: PathBuf,
    pub series_key: String,
    pub series_name: String,
    pub disc_number: Option<u32>,
    pub season: u32,
    pub extraction: DiscEpisodeExtraction,
    pub correlation: CorrelationResult,
}

impl DiscJob {
    pub fn new(
        disc: &DiscoveredDisc,
        extraction: DiscEpisodeExtraction,
        correlation: CorrelationResult,
    ) -> Self {
        Self {
            name: disc.name.clone(),
            path: disc.path.clone(),
            series_key: disc.series_key.clone(),
            series_name: disc.series_name.clone(),
            disc_number: disc.hint.disc_number,
            season: correlation.season,
            extraction,
            correlation,
        }
    }

    pub fn episode_count(&self) -> u32 {
        self.extraction.episode_count
    }

    pub fn confidence(&self) -> f32 {
        self.correlation.confidence
    }
}

/// A disc held back from the current batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingDisc {
    pub disc: DiscJob,
    pub reason: String,
    /// Untracked disc numbers that must be exported first.
    pub missing_discs: Vec<u32>,
}

/// Processable/waiting split of one series' discs.
///
/// Derived from discs plus tracker every cycle; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// Ordered by season, then disc number.
    pub processable: Vec<DiscJob>,
    pub waiting: Vec<WaitingDisc>,
    /// Missing disc numbers per season.
    pub gaps: BTreeMap<u32, BTreeSet<u32>>,
}

impl BatchAnalysis {
    pub fn is_empty(&self) -> bool {
        self.processable.is_empty() && self.waiting.is_empty()
    }
}

/// One episode of an assigned disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSlot {
    pub episode: u32,
    pub title_index: u32,
    pub duration_secs: u64,
    /// `"{Series} - S{ss}E{ee}.mkv"`.
    pub file_name: String,
    /// Path relative to the output root, `{Series}/Season {ss}/{file_name}`.
    pub relative_path: PathBuf,
}

/// Absolute episode range assigned to one disc for the current batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeAssignment {
    pub disc_name: String,
    pub disc_number: Option<u32>,
    pub season: u32,
    /// Season name from the catalog, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_name: Option<String>,
    pub start_episode: u32,
    pub end_episode: u32,
    pub episodes: Vec<EpisodeSlot>,
}

impl EpisodeAssignment {
    pub fn episode_count(&self) -> u32 {
        self.episodes.len() as u32
    }
}
