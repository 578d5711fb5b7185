//! Season tracker records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tracker content for one series, keyed `season{N}`.
pub type SeriesTracker = BTreeMap<String, SeasonTrackerRecord>;

/// Durable progress of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonTrackerRecord {
    /// Highest episode number exported so far. Never decreases.
    pub last_episode: u32,
    /// Disc number of the most recently committed disc.
    #[serde(default)]
    pub last_disc: Option<u32>,
    /// Disc numbers already exported. Only grows.
    #[serde(default)]
    pub processed_discs: BTreeSet<u32>,
    /// Labels of exported discs that carried no disc number.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub processed_labels: BTreeSet<String>,
    pub last_exported_at: DateTime<Utc>,
}

impl SeasonTrackerRecord {
    /// Record for a season nothing has been exported from yet.
    pub fn empty() -> Self {
        Self {
            last_episode: 0,
            last_disc: None,
            processed_discs: BTreeSet::new(),
            processed_labels: BTreeSet::new(),
            last_exported_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Next disc number the analyzer will accept.
    pub fn next_expected_disc(&self) -> u32 {
        self.processed_discs.last().map(|d| d + 1).unwrap_or(1)
    }

    /// Whether the disc has already been exported.
    pub fn is_processed(&self, disc_number: Option<u32>, label: &str) -> bool {
        match disc_number {
            Some(n) => self.processed_discs.contains(&n),
            None => self.processed_labels.contains(label),
        }
    }

    /// Fold one committed disc into the record.
    pub fn commit_disc(
        &mut self,
        disc_number: Option<u32>,
        label: &str,
        end_episode: u32,
        at: DateTime<Utc>,
    ) {
        self.last_episode = self.last_episode.max(end_episode);
        match disc_number {
            Some(n) => {
                self.processed_discs.insert(n);
                self.last_disc = Some(n);
            }
            None => {
                self.processed_labels.insert(label.to_string());
            }
        }
        self.last_exported_at = at;
    }
}

/// Tracker key for a season: `season{N}`.
pub fn season_key(season: u32) -> String {
    format!("season{}", season)
}

/// Inverse of [`season_key`].
pub fn parse_season_key(key: &str) -> Option<u32> {
    key.strip_prefix("season")?.parse().ok()
}

/// Record for `season`, or an empty one.
pub fn season_record(tracker: &SeriesTracker, season: u32) -> SeasonTrackerRecord {
    tracker
        .get(&season_key(season))
        .cloned()
        .unwrap_or_else(SeasonTrackerRecord::empty)
}
