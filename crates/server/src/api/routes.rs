use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, queue, series};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Series batches
        .route("/series", get(series::list_series))
        .route("/series/{key}", get(series::get_series))
        .route("/series/{key}/trigger", post(series::trigger_batch))
        // Scheduler
        .route("/scheduler/status", get(queue::get_status))
        .route("/queue", get(queue::get_queue))
        .route("/jobs", get(queue::list_jobs));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use discsync_core::{
        load_config_from_str,
        testing::{MockDiscScanner, MockRemuxer},
        EpisodeDurationRange, ExportScheduler, FileTrackerStore, FsTransfer, SchedulerDeps,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn create_test_state(temp: &TempDir) -> Arc<AppState> {
        let watch = temp.path().join("watch");
        std::fs::create_dir_all(watch.join("Some Show").join("S1D1")).unwrap();

        let config = load_config_from_str(&format!(
            r#"
[library]
watch_dir = "{}"
output_dir = "{}"

[catalog.tmdb]
api_key = "super-secret"
"#,
            watch.display(),
            temp.path().join("output").display()
        ))
        .unwrap();

        let scheduler = ExportScheduler::new(
            config.scheduler.clone(),
            config.library.clone(),
            EpisodeDurationRange::default(),
            SchedulerDeps {
                scanner: Arc::new(MockDiscScanner::new()),
                catalog: None,
                remuxer: Arc::new(MockRemuxer::new()),
                transfer: Arc::new(FsTransfer::with_defaults()),
                tracker: Arc::new(FileTrackerStore::new(temp.path().join("tracker"))),
            },
        );

        Arc::new(AppState::new(config, Arc::new(scheduler)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let temp = TempDir::new().unwrap();
        let app = create_router(create_test_state(&temp));

        let (status, json) = get(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_config_is_sanitized() {
        let temp = TempDir::new().unwrap();
        let app = create_router(create_test_state(&temp));

        let (status, json) = get(app, "/api/v1/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["catalog"]["tmdb"]["api_key_configured"], true);
        assert!(!json.to_string().contains("super-secret"));
    }

    #[tokio::test]
    async fn test_queue_reports_parallelism() {
        let temp = TempDir::new().unwrap();
        let app = create_router(create_test_state(&temp));

        let (status, json) = get(app, "/api/v1/queue").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["queue_length"], 0);
        assert_eq!(json["parallel_count"], 3);
    }

    #[tokio::test]
    async fn test_unknown_series_is_not_found() {
        let temp = TempDir::new().unwrap();
        let app = create_router(create_test_state(&temp));

        let (status, _) = get(app.clone(), "/api/v1/series/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/series/nope/trigger")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trigger_known_series_is_accepted() {
        let temp = TempDir::new().unwrap();
        let app = create_router(create_test_state(&temp));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/series/some-show/trigger")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let temp = TempDir::new().unwrap();
        let app = create_router(create_test_state(&temp));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("discsync_scheduler_running"));
    }
}
