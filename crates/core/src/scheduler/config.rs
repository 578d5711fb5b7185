//! Export scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::correlation::FLOOR_CONFIDENCE;

/// Configuration for the export scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Enable/disable the polling loop.
    /// When disabled, batches only run through `trigger_batch`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How often to scan the watch directory (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Export tasks running at once within a batch.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_exports: usize,

    /// Lowest correlation confidence the polling loop exports on its own.
    /// Seasons with a processable disc below it wait for a manual trigger.
    /// Defaults to the correlation floor, so nothing is held unless raised.
    #[serde(default = "default_min_confidence")]
    pub auto_export_min_confidence: f32,

    /// Retry policy for retryable remux/transfer errors.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub initial_delay_secs: u64,

    /// Maximum delay between retries in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    60
}

fn default_max_parallel() -> usize {
    3
}

fn default_min_confidence() -> f32 {
    FLOOR_CONFIDENCE
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    30
}

fn default_max_delay() -> u64 {
    600 // 10 minutes
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_retry_delay(),
            max_delay_secs: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Retry policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_delay_secs as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay_secs as f64).max(0.0))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
            max_parallel_exports: default_max_parallel(),
            auto_export_min_confidence: default_min_confidence(),
            retry: RetryConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_exports = max;
        self
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.auto_export_min_confidence = confidence;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
