mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use discsync_core::{
    load_config, validate_config, EpisodeCatalogSource, ExportScheduler, FileTrackerStore,
    FsTransfer, MakeMkvRemuxer, MakeMkvScanner, SchedulerDeps, TmdbCatalogSource,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    let json_logs = std::env::var("DISCSYNC_LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Determine config path
    let config_path = std::env::var("DISCSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("discsync {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded successfully (hash {})", &config_hash[..16]);
    info!("Watch directory: {:?}", config.library.watch_dir);
    info!("Output directory: {:?}", config.library.output_dir);
    info!("Tracker directory: {:?}", config.tracker.dir);

    for dir in [&config.library.output_dir, &config.library.temp_dir, &config.tracker.dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }

    // Create catalog source if configured
    let catalog: Option<Arc<dyn EpisodeCatalogSource>> = match &config.catalog.tmdb {
        Some(tmdb_config) => match TmdbCatalogSource::new(tmdb_config.clone()) {
            Ok(source) => {
                info!("Initializing TMDB episode catalog");
                Some(Arc::new(source))
            }
            Err(e) => {
                error!("Failed to create TMDB catalog source: {}", e);
                None
            }
        },
        None => {
            warn!("No episode catalog configured, correlation will use the fallback only");
            None
        }
    };

    // Create scheduler
    let deps = SchedulerDeps {
        scanner: Arc::new(MakeMkvScanner::new(config.scanner.clone())),
        catalog,
        remuxer: Arc::new(MakeMkvRemuxer::new(config.remuxer.clone())),
        transfer: Arc::new(FsTransfer::new(config.transfer.clone())),
        tracker: Arc::new(FileTrackerStore::new(config.tracker.dir.clone())),
    };

    let scheduler = Arc::new(ExportScheduler::new(
        config.scheduler.clone(),
        config.library.clone(),
        config.scanner.episode_range(),
        deps,
    ));

    scheduler.start().await;

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&scheduler)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Stopping export scheduler...");
    scheduler.stop().await;
    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
