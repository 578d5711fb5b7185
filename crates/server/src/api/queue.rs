//! Scheduler, queue and job API handlers.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use discsync_core::{JobStatus, QueueStatus, SchedulerStatus};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobStatus>,
    pub generated_at: DateTime<Utc>,
}

/// Scheduler running state and last scan time
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler().status().await)
}

/// Export queue counters
pub async fn get_queue(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.scheduler().queue_status())
}

/// Per-disc job states
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobsResponse> {
    Json(JobsResponse {
        jobs: state.scheduler().jobs().await,
        generated_at: Utc::now(),
    })
}
