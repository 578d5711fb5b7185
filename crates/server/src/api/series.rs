//! Series batch API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use discsync_core::{SchedulerError, SeriesBatchStatus};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Batch status of every known series
#[derive(Debug, Serialize)]
pub struct SeriesListResponse {
    pub series: BTreeMap<String, SeriesBatchStatus>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// List processable and waiting discs per series, as of the last scan
pub async fn list_series(State(state): State<Arc<AppState>>) -> Json<SeriesListResponse> {
    Json(SeriesListResponse {
        series: state.scheduler().series_batch_status().await,
    })
}

/// Batch status of one series
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<SeriesBatchStatus>, ApiError> {
    state
        .scheduler()
        .series_batch_status()
        .await
        .remove(&key)
        .map(Json)
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                SchedulerError::SeriesNotFound(key),
            )
        })
}

/// Start an export batch for a series now, bypassing the confidence gate.
///
/// Returns immediately; progress shows up under `/jobs`.
pub async fn trigger_batch(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let scheduler = Arc::clone(state.scheduler());

    match scheduler.series_exists(&key).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                SchedulerError::SeriesNotFound(key),
            ))
        }
        Err(e) => return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }

    if scheduler.is_series_busy(&key) {
        return Err(api_error(
            StatusCode::CONFLICT,
            SchedulerError::BatchInProgress(key),
        ));
    }

    let series_key = key.clone();
    tokio::spawn(async move {
        match scheduler.trigger_batch(&series_key).await {
            Ok(report) => info!(
                "Triggered batch for '{}' done: {} exported, {} failed",
                series_key,
                report.exported.len(),
                report.failed.len()
            ),
            Err(e) => error!("Triggered batch for '{}' failed: {}", series_key, e),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: format!("Export batch started for series '{}'", key),
        }),
    ))
}
