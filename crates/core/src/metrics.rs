//! Prometheus metrics for core components.
//!
//! Registered into the server's registry at startup:
//! - Correlation (confidence by heuristic)
//! - Batches (analysis outcome, assignments)
//! - Exports (per-disc results, durations, retries)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Correlation Metrics
// =============================================================================

/// Correlation confidence by heuristic family.
pub static CORRELATION_CONFIDENCE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "discsync_correlation_confidence",
            "Distribution of disc correlation confidence scores",
        )
        .buckets(vec![0.65, 0.7, 0.75, 0.8, 0.85, 0.9, 0.95, 1.0]),
        &["heuristic"], // "h1", "h2", "h3", "fallback"
    )
    .unwrap()
});

/// Disc scans total by result.
pub static DISC_SCANS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("discsync_disc_scans_total", "Total disc scans"),
        &["result"], // "success", "failed", "cached"
    )
    .unwrap()
});

/// Catalog lookups total by result.
pub static CATALOG_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("discsync_catalog_lookups_total", "Total episode catalog lookups"),
        &["result"], // "success", "failed", "cached"
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Discs held back in the most recent scan.
pub static DISCS_WAITING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "discsync_discs_waiting",
        "Discs waiting on a missing sibling, a disc number or a manual trigger",
    )
    .unwrap()
});

/// Series batches total by result.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("discsync_batches_total", "Total series batches"),
        &["result"], // "completed", "partial", "empty", "aborted"
    )
    .unwrap()
});

/// Episodes assigned total.
pub static EPISODES_ASSIGNED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "discsync_episodes_assigned_total",
        "Total episode numbers assigned to discs",
    )
    .unwrap()
});

// =============================================================================
// Export Metrics
// =============================================================================

/// Disc exports total by result.
pub static DISC_EXPORTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("discsync_disc_exports_total", "Total disc exports"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Disc export duration in seconds.
pub static EXPORT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "discsync_export_duration_seconds",
            "Duration of a full disc export",
        )
        .buckets(vec![
            10.0, 30.0, 60.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0, 7200.0,
        ]),
        &["result"],
    )
    .unwrap()
});

/// Retry attempts total by phase.
pub static RETRY_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("discsync_retry_attempts_total", "Total retry attempts"),
        &["phase"], // "remux", "transfer"
    )
    .unwrap()
});

/// All core metrics, for registration by the server.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Correlation
        Box::new(CORRELATION_CONFIDENCE.clone()),
        Box::new(DISC_SCANS.clone()),
        Box::new(CATALOG_LOOKUPS.clone()),
        // Batches
        Box::new(DISCS_WAITING.clone()),
        Box::new(BATCHES_TOTAL.clone()),
        Box::new(EPISODES_ASSIGNED.clone()),
        // Exports
        Box::new(DISC_EXPORTS.clone()),
        Box::new(EXPORT_DURATION.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
    ]
}
