//! Types for the export scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use thiserror::Error;

use crate::batch::{DiscJob, WaitingDisc};
use crate::exporter::{RemuxError, TransferError};

/// Errors that abort a series batch.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Another batch for this series is still running.
    #[error("batch already in progress for series: {0}")]
    BatchInProgress(String),

    /// No discs were discovered for the series.
    #[error("series not found: {0}")]
    SeriesNotFound(String),

    /// Tracker could not be read or written.
    #[error("tracker error: {0}")]
    Tracker(#[from] crate::tracker::TrackerError),

    /// Watch directory could not be listed.
    #[error("discovery failed: {0}")]
    Discovery(#[from] std::io::Error),
}

/// Why a single disc export failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("remux failed for title {title_index}: {source}")]
    Remux {
        title_index: u32,
        #[source]
        source: RemuxError,
    },

    #[error("transfer failed for episode {episode}: {source}")]
    Transfer {
        episode: u32,
        #[source]
        source: TransferError,
    },

    #[error("no episode assignment for disc {0}")]
    Unassigned(String),

    #[error("export task aborted: {0}")]
    Aborted(String),
}

/// Per-disc job state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiscJobState {
    Discovered,
    Waiting {
        reason: String,
        missing_discs: Vec<u32>,
    },
    Assigned {
        season: u32,
        start_episode: u32,
        end_episode: u32,
    },
    Exporting {
        season: u32,
        start_episode: u32,
        end_episode: u32,
        started_at: DateTime<Utc>,
    },
    Exported {
        season: u32,
        start_episode: u32,
        end_episode: u32,
        finished_at: DateTime<Utc>,
    },
    /// Retried on the next scan.
    Failed { error: String },
}

impl DiscJobState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Waiting { .. } => "waiting",
            Self::Assigned { .. } => "assigned",
            Self::Exporting { .. } => "exporting",
            Self::Exported { .. } => "exported",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Job status of one disc, as shown by `jobs()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub series_key: String,
    pub disc_name: String,
    pub disc_path: PathBuf,
    #[serde(flatten)]
    pub state: DiscJobState,
    pub updated_at: DateTime<Utc>,
}

/// Compact view of a correlated disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscSummary {
    pub name: String,
    pub disc_number: Option<u32>,
    pub season: u32,
    pub episode_count: u32,
    pub confidence: f32,
    pub heuristic: String,
    pub correlation_reason: String,
}

impl From<&DiscJob> for DiscSummary {
    fn from(disc: &DiscJob) -> Self {
        Self {
            name: disc.name.clone(),
            disc_number: disc.disc_number,
            season: disc.season,
            episode_count: disc.episode_count(),
            confidence: disc.confidence(),
            heuristic: disc.correlation.heuristic_used().to_string(),
            correlation_reason: disc.correlation.correlation_reason.clone(),
        }
    }
}

/// A disc that is not part of the current batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingSummary {
    #[serde(flatten)]
    pub disc: DiscSummary,
    pub reason: String,
    pub missing_discs: Vec<u32>,
}

impl From<&WaitingDisc> for WaitingSummary {
    fn from(waiting: &WaitingDisc) -> Self {
        Self {
            disc: DiscSummary::from(&waiting.disc),
            reason: waiting.reason.clone(),
            missing_discs: waiting.missing_discs.clone(),
        }
    }
}

/// Latest batch view of one series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesBatchStatus {
    pub series_name: String,
    pub processable: Vec<DiscSummary>,
    pub waiting: Vec<WaitingSummary>,
    /// Missing disc numbers per season.
    pub gaps: BTreeMap<u32, BTreeSet<u32>>,
    pub last_exported: Option<DateTime<Utc>>,
}

/// Export queue counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Assigned discs not yet started.
    pub queue_length: usize,
    /// Discs currently exporting.
    pub processing: usize,
    /// Configured export parallelism.
    pub parallel_count: usize,
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub queue: QueueStatus,
}

/// Result of exporting one disc.
#[derive(Debug)]
pub struct DiscExportOutcome {
    pub disc_name: String,
    pub result: Result<Vec<PathBuf>, ExportError>,
}

impl DiscExportOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of one series batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub series_key: String,
    /// Exported and committed to the tracker.
    pub exported: Vec<String>,
    /// Exported but behind a failed sibling; re-derived next scan.
    pub uncommitted: Vec<String>,
    pub failed: Vec<String>,
    /// Discs held back by the analyzer or the confidence gate.
    pub waiting: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_serialization() {
        let status = JobStatus {
            series_key: "show".to_string(),
            disc_name: "S1D3".to_string(),
            disc_path: PathBuf::from("/watch/Show/S1D3"),
            state: DiscJobState::Waiting {
                reason: "waiting for disc(s) 2 of season 1".to_string(),
                missing_discs: vec![2],
            },
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "waiting");
        assert_eq!(json["missing_discs"][0], 2);
        assert_eq!(json["disc_name"], "S1D3");
    }

    #[test]
    fn test_error_display() {
        let err = SchedulerError::BatchInProgress("breaking-bad".to_string());
        assert_eq!(
            err.to_string(),
            "batch already in progress for series: breaking-bad"
        );
    }

    #[test]
    fn test_state_names() {
        assert_eq!(DiscJobState::Discovered.name(), "discovered");
        assert_eq!(
            DiscJobState::Failed {
                error: "x".to_string()
            }
            .name(),
            "failed"
        );
    }
}
