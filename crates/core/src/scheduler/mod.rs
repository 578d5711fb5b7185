//! Parallel export scheduler.
//!
//! Drives discs through `discovered -> assigned -> exporting -> exported`,
//! with `waiting` for discs held back by a gap or the confidence gate and
//! `failed` for discs retried on the next scan.

mod config;
mod runner;
mod types;

pub use config::{RetryConfig, SchedulerConfig};
pub use runner::{ExportScheduler, SchedulerDeps};
pub use types::{
    BatchReport, DiscExportOutcome, DiscJobState, DiscSummary, ExportError, JobStatus,
    QueueStatus, SchedulerError, SchedulerStatus, SeriesBatchStatus, WaitingSummary,
};
