//! Export scheduler implementation.
//!
//! One scan cycle discovers discs, and for each series:
//! - Correlation: sequential, every disc scanned once and cached
//! - Assignment: sequential, completes before any export starts
//! - Export: concurrent, chunks of `max_parallel_exports` tasks
//! - Tracker commit: once, after every chunk has finished

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::batch::{analyze, assign, DiscJob, EpisodeAssignment, WaitingDisc};
use crate::catalog::{EpisodeCatalogSource, SeriesEpisodeCatalog};
use crate::config::LibraryConfig;
use crate::correlation::{correlate, HeuristicKind};
use crate::disc::{
    discover_discs, extract_episodes, DiscEpisodeExtraction, DiscScanner, DiscoveredDisc,
    EpisodeDurationRange, ScannerError,
};
use crate::exporter::{RemuxError, Remuxer, Transfer, TransferError};
use crate::metrics;
use crate::tracker::{SeriesTracker, TrackerStore};

use super::config::{RetryConfig, SchedulerConfig};
use super::types::{
    BatchReport, DiscExportOutcome, DiscJobState, DiscSummary, ExportError, JobStatus,
    QueueStatus, SchedulerError, SchedulerStatus, SeriesBatchStatus, WaitingSummary,
};

/// External collaborators used by the scheduler.
pub struct SchedulerDeps {
    pub scanner: Arc<dyn DiscScanner>,
    /// Without a catalog every disc gets the no-catalog fallback.
    pub catalog: Option<Arc<dyn EpisodeCatalogSource>>,
    pub remuxer: Arc<dyn Remuxer>,
    pub transfer: Arc<dyn Transfer>,
    pub tracker: Arc<dyn TrackerStore>,
}

/// Shared state behind the scheduler handle and its spawned tasks.
struct SchedulerContext {
    config: SchedulerConfig,
    library: LibraryConfig,
    episode_range: EpisodeDurationRange,
    deps: SchedulerDeps,

    scan_cache: RwLock<HashMap<PathBuf, DiscEpisodeExtraction>>,
    catalog_cache: RwLock<HashMap<String, SeriesEpisodeCatalog>>,
    in_flight: Mutex<HashSet<String>>,
    jobs: RwLock<BTreeMap<(String, String), JobStatus>>,
    series_status: RwLock<BTreeMap<String, SeriesBatchStatus>>,
    last_scan_at: RwLock<Option<DateTime<Utc>>>,
    queued: AtomicUsize,
    processing: AtomicUsize,
}

/// Removes a series from the in-flight set when the batch ends.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    series_key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.series_key);
    }
}

/// Counts a running export for as long as it is alive, panics included.
struct ProcessingGuard<'a>(&'a AtomicUsize);

impl<'a> ProcessingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The export scheduler: discovers discs, plans batches and runs exports.
pub struct ExportScheduler {
    ctx: Arc<SchedulerContext>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ExportScheduler {
    pub fn new(
        config: SchedulerConfig,
        library: LibraryConfig,
        episode_range: EpisodeDurationRange,
        deps: SchedulerDeps,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            ctx: Arc::new(SchedulerContext {
                config,
                library,
                episode_range,
                deps,
                scan_cache: RwLock::new(HashMap::new()),
                catalog_cache: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashSet::new()),
                jobs: RwLock::new(BTreeMap::new()),
                series_status: RwLock::new(BTreeMap::new()),
                last_scan_at: RwLock::new(None),
                queued: AtomicUsize::new(0),
                processing: AtomicUsize::new(0),
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the polling loop.
    pub async fn start(&self) {
        if !self.ctx.config.enabled {
            info!("Export scheduler disabled, batches run on manual trigger only");
            return;
        }

        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Export scheduler already running");
            return;
        }

        info!(
            "Starting export scheduler (interval {}s, {} parallel exports)",
            self.ctx.config.poll_interval_secs, self.ctx.config.max_parallel_exports
        );
        self.spawn_scan_loop();
    }

    /// Stop the polling loop. A cycle already in progress runs to completion.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping export scheduler");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            last_scan_at: *self.ctx.last_scan_at.read().await,
            queue: self.queue_status(),
        }
    }

    /// Run one full discovery and export cycle over every series.
    pub async fn scan_once(&self) -> Result<Vec<BatchReport>, SchedulerError> {
        self.ctx.scan_once().await
    }

    /// Export a series now, including seasons held by the confidence gate.
    pub async fn trigger_batch(&self, series_key: &str) -> Result<BatchReport, SchedulerError> {
        let discs: Vec<DiscoveredDisc> = discover_discs(&self.ctx.library.watch_dir)
            .await?
            .into_iter()
            .filter(|d| d.series_key == series_key)
            .collect();

        if discs.is_empty() {
            return Err(SchedulerError::SeriesNotFound(series_key.to_string()));
        }

        info!("Manual export triggered for series '{}'", series_key);
        self.ctx.process_series(series_key, discs, true).await
    }

    /// Whether the watch directory currently holds discs for this series.
    pub async fn series_exists(&self, series_key: &str) -> Result<bool, SchedulerError> {
        Ok(discover_discs(&self.ctx.library.watch_dir)
            .await?
            .iter()
            .any(|d| d.series_key == series_key))
    }

    /// Whether a batch for this series is currently running.
    pub fn is_series_busy(&self, series_key: &str) -> bool {
        self.ctx
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(series_key)
    }

    /// Latest batch view per series, as of the last scan.
    pub async fn series_batch_status(&self) -> BTreeMap<String, SeriesBatchStatus> {
        self.ctx.series_status.read().await.clone()
    }

    pub fn queue_status(&self) -> QueueStatus {
        QueueStatus {
            queue_length: self.ctx.queued.load(Ordering::Relaxed),
            processing: self.ctx.processing.load(Ordering::Relaxed),
            parallel_count: self.ctx.config.max_parallel_exports,
        }
    }

    /// Per-disc job states, ordered by series and disc.
    pub async fn jobs(&self) -> Vec<JobStatus> {
        self.ctx.jobs.read().await.values().cloned().collect()
    }

    /// Export pre-assigned discs in chunks of `max_parallel`.
    ///
    /// Every task of a chunk is awaited before the next chunk starts. A
    /// failed task never cancels its siblings. Outcomes follow `discs` order.
    pub async fn run_batch(
        &self,
        discs: &[DiscJob],
        assignments: &BTreeMap<String, EpisodeAssignment>,
        max_parallel: usize,
    ) -> Vec<DiscExportOutcome> {
        self.ctx.run_batch(discs, assignments, max_parallel).await
    }

    fn spawn_scan_loop(&self) {
        let ctx = Arc::clone(&self.ctx);
        let running = Arc::clone(&self.running);
        let interval = Duration::from_secs(ctx.config.poll_interval_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Scan loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scan loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = ctx.scan_once().await {
                            warn!("Scan cycle failed: {}", e);
                        }
                    }
                }
            }
            info!("Scan loop stopped");
        });
    }
}

impl SchedulerContext {
    async fn scan_once(self: &Arc<Self>) -> Result<Vec<BatchReport>, SchedulerError> {
        let discs = discover_discs(&self.library.watch_dir).await?;
        *self.last_scan_at.write().await = Some(Utc::now());

        let present: HashSet<PathBuf> = discs.iter().map(|d| d.path.clone()).collect();
        self.scan_cache
            .write()
            .await
            .retain(|path, _| present.contains(path));

        let mut by_series: BTreeMap<String, Vec<DiscoveredDisc>> = BTreeMap::new();
        for disc in discs {
            by_series.entry(disc.series_key.clone()).or_default().push(disc);
        }

        self.series_status
            .write()
            .await
            .retain(|key, _| by_series.contains_key(key));

        debug!("Scan found {} series", by_series.len());

        let mut reports = Vec::new();
        for (series_key, series_discs) in by_series {
            match self.process_series(&series_key, series_discs, false).await {
                Ok(report) => reports.push(report),
                Err(SchedulerError::BatchInProgress(key)) => {
                    debug!("Series '{}' busy, skipping this cycle", key);
                }
                Err(e) => {
                    error!("Batch for series '{}' aborted: {}", series_key, e);
                }
            }
        }

        let waiting: usize = self
            .series_status
            .read()
            .await
            .values()
            .map(|s| s.waiting.len())
            .sum();
        metrics::DISCS_WAITING.set(waiting as i64);

        Ok(reports)
    }

    fn acquire_series(&self, series_key: &str) -> Result<InFlightGuard<'_>, SchedulerError> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(series_key.to_string()) {
            return Err(SchedulerError::BatchInProgress(series_key.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            series_key: series_key.to_string(),
        })
    }

    /// Plan and run one batch for a series.
    ///
    /// `force` bypasses the low-confidence gate.
    async fn process_series(
        self: &Arc<Self>,
        series_key: &str,
        discs: Vec<DiscoveredDisc>,
        force: bool,
    ) -> Result<BatchReport, SchedulerError> {
        let _guard = self.acquire_series(series_key)?;
        let mut report = BatchReport {
            series_key: series_key.to_string(),
            ..Default::default()
        };

        let tracker = match self.deps.tracker.read(series_key).await {
            Ok(tracker) => tracker,
            Err(e) => {
                metrics::BATCHES_TOTAL.with_label_values(&["aborted"]).inc();
                return Err(e.into());
            }
        };

        let series_name = discs
            .first()
            .map(|d| d.series_name.clone())
            .unwrap_or_else(|| series_key.to_string());
        let catalog = self.lookup_catalog(&series_name).await;

        let mut correlated = Vec::with_capacity(discs.len());
        for disc in &discs {
            match self.scan_disc(disc).await {
                Ok(extraction) => {
                    let result = correlate(
                        disc.hint.disc_number,
                        extraction.episode_count,
                        disc.hint.season_number,
                        catalog.as_ref(),
                    );
                    metrics::CORRELATION_CONFIDENCE
                        .with_label_values(&[heuristic_label(result.heuristic.kind())])
                        .observe(result.confidence as f64);
                    correlated.push(DiscJob::new(disc, extraction, result));
                }
                Err(e) => {
                    warn!("Scan of disc '{}' failed: {}", disc.name, e);
                    self.set_job_state(
                        series_key,
                        &disc.name,
                        &disc.path,
                        DiscJobState::Failed {
                            error: e.to_string(),
                        },
                    )
                    .await;
                    report.failed.push(disc.name.clone());
                }
            }
        }

        let analysis = analyze(&correlated, &tracker);
        let (processable, held) = if force {
            (analysis.processable.clone(), Vec::new())
        } else {
            gate_low_confidence(
                analysis.processable.clone(),
                self.config.auto_export_min_confidence,
            )
        };

        let mut waiting = analysis.waiting.clone();
        waiting.extend(held);

        for w in &waiting {
            self.set_job_state(
                series_key,
                &w.disc.name,
                &w.disc.path,
                DiscJobState::Waiting {
                    reason: w.reason.clone(),
                    missing_discs: w.missing_discs.clone(),
                },
            )
            .await;
            report.waiting.push(w.disc.name.clone());
        }

        self.series_status.write().await.insert(
            series_key.to_string(),
            SeriesBatchStatus {
                series_name: series_name.clone(),
                processable: processable.iter().map(DiscSummary::from).collect(),
                waiting: waiting.iter().map(WaitingSummary::from).collect(),
                gaps: analysis.gaps.clone(),
                last_exported: last_exported(&tracker),
            },
        );

        if processable.is_empty() {
            metrics::BATCHES_TOTAL.with_label_values(&["empty"]).inc();
            return Ok(report);
        }

        let assignments = assign(&processable, &tracker, catalog.as_ref());
        for disc in &processable {
            if let Some(a) = assignments.get(&disc.name) {
                metrics::EPISODES_ASSIGNED.inc_by(a.episode_count() as u64);
                self.set_job_state(
                    series_key,
                    &disc.name,
                    &disc.path,
                    DiscJobState::Assigned {
                        season: a.season,
                        start_episode: a.start_episode,
                        end_episode: a.end_episode,
                    },
                )
                .await;
            }
        }

        info!(
            "Exporting {} disc(s) of '{}' ({} waiting)",
            processable.len(),
            series_name,
            waiting.len()
        );

        let outcomes = self
            .run_batch(&processable, &assignments, self.config.max_parallel_exports)
            .await;

        let commit = commit_batch(&tracker, &processable, &assignments, &outcomes, Utc::now());
        if !commit.committed.is_empty() {
            if let Err(e) = self.deps.tracker.write(series_key, &commit.tracker).await {
                metrics::BATCHES_TOTAL.with_label_values(&["aborted"]).inc();
                return Err(e.into());
            }
            if let Some(status) = self.series_status.write().await.get_mut(series_key) {
                status.last_exported = last_exported(&commit.tracker);
                status
                    .processable
                    .retain(|d| !commit.committed.contains(&d.name));
            }
        }

        report.exported = commit.committed;
        report.uncommitted = commit.uncommitted;
        report.failed.extend(
            outcomes
                .iter()
                .filter(|o| !o.is_success())
                .map(|o| o.disc_name.clone()),
        );

        let result = if outcomes.iter().all(DiscExportOutcome::is_success) {
            "completed"
        } else {
            "partial"
        };
        metrics::BATCHES_TOTAL.with_label_values(&[result]).inc();

        info!(
            "Batch for '{}' finished: {} exported, {} uncommitted, {} failed",
            series_name,
            report.exported.len(),
            report.uncommitted.len(),
            report.failed.len()
        );

        Ok(report)
    }

    async fn lookup_catalog(&self, series_name: &str) -> Option<SeriesEpisodeCatalog> {
        let source = self.deps.catalog.as_ref()?;

        if let Some(cached) = self.catalog_cache.read().await.get(series_name) {
            metrics::CATALOG_LOOKUPS.with_label_values(&["cached"]).inc();
            return Some(cached.clone());
        }

        match source.lookup(series_name).await {
            Ok(catalog) => {
                metrics::CATALOG_LOOKUPS.with_label_values(&["success"]).inc();
                debug!(
                    "Catalog for '{}' from {}: {} seasons",
                    series_name,
                    source.name(),
                    catalog.total_seasons
                );
                self.catalog_cache
                    .write()
                    .await
                    .insert(series_name.to_string(), catalog.clone());
                Some(catalog)
            }
            Err(e) => {
                metrics::CATALOG_LOOKUPS.with_label_values(&["failed"]).inc();
                warn!(
                    "Catalog lookup for '{}' failed, using no-catalog fallback: {}",
                    series_name, e
                );
                None
            }
        }
    }

    async fn scan_disc(&self, disc: &DiscoveredDisc) -> Result<DiscEpisodeExtraction, ScannerError> {
        if let Some(cached) = self.scan_cache.read().await.get(&disc.path) {
            metrics::DISC_SCANS.with_label_values(&["cached"]).inc();
            return Ok(cached.clone());
        }

        let titles = match self.deps.scanner.scan(&disc.path).await {
            Ok(titles) => titles,
            Err(e) => {
                metrics::DISC_SCANS.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };
        metrics::DISC_SCANS.with_label_values(&["success"]).inc();

        let extraction = extract_episodes(&titles, self.episode_range);
        debug!(
            "Disc '{}': {} of {} titles are episodes",
            disc.name,
            extraction.episode_count,
            titles.len()
        );
        self.scan_cache
            .write()
            .await
            .insert(disc.path.clone(), extraction.clone());
        Ok(extraction)
    }

    async fn set_job_state(
        &self,
        series_key: &str,
        disc_name: &str,
        disc_path: &Path,
        state: DiscJobState,
    ) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(
            (series_key.to_string(), disc_name.to_string()),
            JobStatus {
                series_key: series_key.to_string(),
                disc_name: disc_name.to_string(),
                disc_path: disc_path.to_path_buf(),
                state,
                updated_at: Utc::now(),
            },
        );
    }

    async fn run_batch(
        self: &Arc<Self>,
        discs: &[DiscJob],
        assignments: &BTreeMap<String, EpisodeAssignment>,
        max_parallel: usize,
    ) -> Vec<DiscExportOutcome> {
        let max_parallel = max_parallel.max(1);
        let mut outcomes = Vec::with_capacity(discs.len());
        self.queued.fetch_add(discs.len(), Ordering::SeqCst);

        for chunk in discs.chunks(max_parallel) {
            let handles: Vec<_> = chunk
                .iter()
                .map(|disc| {
                    let ctx = Arc::clone(self);
                    let disc = disc.clone();
                    let assignment = assignments.get(&disc.name).cloned();
                    tokio::spawn(async move { ctx.run_export_task(disc, assignment).await })
                })
                .collect();

            let results = join_all(handles).await;

            for (disc, joined) in chunk.iter().zip(results) {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Export task for '{}' panicked: {}", disc.name, e);
                        let err = ExportError::Aborted(e.to_string());
                        self.set_job_state(
                            &disc.series_key,
                            &disc.name,
                            &disc.path,
                            DiscJobState::Failed {
                                error: err.to_string(),
                            },
                        )
                        .await;
                        Err(err)
                    }
                };
                outcomes.push(DiscExportOutcome {
                    disc_name: disc.name.clone(),
                    result,
                });
            }
        }

        outcomes
    }

    async fn run_export_task(
        self: Arc<Self>,
        disc: DiscJob,
        assignment: Option<EpisodeAssignment>,
    ) -> Result<Vec<PathBuf>, ExportError> {
        self.queued.fetch_sub(1, Ordering::SeqCst);

        let Some(assignment) = assignment else {
            let err = ExportError::Unassigned(disc.name.clone());
            self.set_job_state(
                &disc.series_key,
                &disc.name,
                &disc.path,
                DiscJobState::Failed {
                    error: err.to_string(),
                },
            )
            .await;
            return Err(err);
        };

        let processing = ProcessingGuard::enter(&self.processing);
        self.set_job_state(
            &disc.series_key,
            &disc.name,
            &disc.path,
            DiscJobState::Exporting {
                season: assignment.season,
                start_episode: assignment.start_episode,
                end_episode: assignment.end_episode,
                started_at: Utc::now(),
            },
        )
        .await;

        let start = Instant::now();
        let result = self.export_disc(&disc, &assignment).await;
        let elapsed = start.elapsed().as_secs_f64();
        drop(processing);

        let state = match &result {
            Ok(paths) => {
                info!(
                    "Exported disc '{}' as S{:02}E{:02}-E{:02} ({} files)",
                    disc.name,
                    assignment.season,
                    assignment.start_episode,
                    assignment.end_episode,
                    paths.len()
                );
                metrics::DISC_EXPORTS.with_label_values(&["success"]).inc();
                metrics::EXPORT_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);
                DiscJobState::Exported {
                    season: assignment.season,
                    start_episode: assignment.start_episode,
                    end_episode: assignment.end_episode,
                    finished_at: Utc::now(),
                }
            }
            Err(e) => {
                warn!("Export of disc '{}' failed: {}", disc.name, e);
                metrics::DISC_EXPORTS.with_label_values(&["failed"]).inc();
                metrics::EXPORT_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed);
                DiscJobState::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.set_job_state(&disc.series_key, &disc.name, &disc.path, state)
            .await;

        result
    }

    async fn export_disc(
        &self,
        disc: &DiscJob,
        assignment: &EpisodeAssignment,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let work_dir = self
            .library
            .temp_dir
            .join(&disc.series_key)
            .join(format!("{}-{}", disc.name, uuid::Uuid::new_v4()));

        let result = self.export_episodes(disc, assignment, &work_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clean up {}: {}", work_dir.display(), e);
            }
        }
        result
    }

    async fn export_episodes(
        &self,
        disc: &DiscJob,
        assignment: &EpisodeAssignment,
        work_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let remuxer: &dyn Remuxer = self.deps.remuxer.as_ref();
        let transfer: &dyn Transfer = self.deps.transfer.as_ref();
        let disc_path: &Path = &disc.path;
        let retry = &self.config.retry;
        let mut placed = Vec::with_capacity(assignment.episodes.len());

        for slot in &assignment.episodes {
            let destination = self.library.output_dir.join(&slot.relative_path);

            // A previous run may have placed this episode before its batch
            // could be committed.
            if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
                info!(
                    "{} already present, skipping remux",
                    destination.display()
                );
                placed.push(destination);
                continue;
            }

            let title_index = slot.title_index;
            let title_dir = work_dir.join(format!("t{:02}", title_index));
            let title_dir: &Path = &title_dir;

            let local = with_retry(retry, "remux", RemuxError::is_retryable, || async move {
                let _ = tokio::fs::remove_dir_all(title_dir).await;
                remuxer.remux(disc_path, title_index, title_dir).await
            })
            .await
            .map_err(|source| ExportError::Remux {
                title_index,
                source,
            })?;

            let local: &Path = &local;
            let destination: &Path = &destination;
            let final_path = with_retry(retry, "transfer", TransferError::is_retryable, || {
                transfer.transfer(local, destination)
            })
            .await
            .map_err(|source| ExportError::Transfer {
                episode: slot.episode,
                source,
            })?;

            debug!("Placed episode {} at {}", slot.episode, final_path.display());
            placed.push(final_path);
        }

        Ok(placed)
    }
}

/// Run `op`, retrying retryable failures with exponential backoff.
async fn with_retry<T, E, F, Fut>(
    retry: &RetryConfig,
    phase: &str,
    is_retryable: fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = retry.delay_for(attempt);
                warn!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    phase, attempt, max_attempts, delay, e
                );
                metrics::RETRY_ATTEMPTS.with_label_values(&[phase]).inc();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Tracker after a batch, plus which successful discs it covers.
#[derive(Debug)]
pub(crate) struct BatchCommit {
    pub tracker: SeriesTracker,
    pub committed: Vec<String>,
    pub uncommitted: Vec<String>,
}

/// Fold successful exports into the tracker.
///
/// Per season, discs are committed in disc order up to the first failure;
/// later successes stay uncommitted so the tracker never skips a range.
pub(crate) fn commit_batch(
    tracker: &SeriesTracker,
    processable: &[DiscJob],
    assignments: &BTreeMap<String, EpisodeAssignment>,
    outcomes: &[DiscExportOutcome],
    now: DateTime<Utc>,
) -> BatchCommit {
    let succeeded: HashSet<&str> = outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| o.disc_name.as_str())
        .collect();

    let mut updated = tracker.clone();
    let mut committed = Vec::new();
    let mut uncommitted = Vec::new();
    let mut blocked_seasons = BTreeSet::new();

    let mut ordered: Vec<&DiscJob> = processable.iter().collect();
    ordered.sort_by(|a, b| {
        a.season
            .cmp(&b.season)
            .then_with(|| a.disc_number.cmp(&b.disc_number))
            .then_with(|| a.name.cmp(&b.name))
    });

    for disc in ordered {
        let assignment = assignments.get(&disc.name);
        let ok = succeeded.contains(disc.name.as_str()) && assignment.is_some();

        match (ok, assignment) {
            (true, Some(a)) if !blocked_seasons.contains(&disc.season) => {
                let record = updated
                    .entry(crate::tracker::season_key(a.season))
                    .or_insert_with(crate::tracker::SeasonTrackerRecord::empty);
                record.commit_disc(disc.disc_number, &disc.name, a.end_episode, now);
                committed.push(disc.name.clone());
            }
            (true, _) => uncommitted.push(disc.name.clone()),
            (false, _) => {
                blocked_seasons.insert(disc.season);
            }
        }
    }

    BatchCommit {
        tracker: updated,
        committed,
        uncommitted,
    }
}

/// Hold back every season with a processable disc below `min_confidence`.
fn gate_low_confidence(
    processable: Vec<DiscJob>,
    min_confidence: f32,
) -> (Vec<DiscJob>, Vec<WaitingDisc>) {
    let low_seasons: BTreeSet<u32> = processable
        .iter()
        .filter(|d| d.confidence() < min_confidence)
        .map(|d| d.season)
        .collect();

    if low_seasons.is_empty() {
        return (processable, Vec::new());
    }

    let (held, ready): (Vec<DiscJob>, Vec<DiscJob>) = processable
        .into_iter()
        .partition(|d| low_seasons.contains(&d.season));

    let held = held
        .into_iter()
        .map(|disc| {
            let reason = if disc.confidence() < min_confidence {
                format!(
                    "low correlation confidence {:.2} ({}); awaiting manual trigger",
                    disc.confidence(),
                    disc.correlation.correlation_reason
                )
            } else {
                format!(
                    "season {} has a low-confidence disc; awaiting manual trigger",
                    disc.season
                )
            };
            WaitingDisc {
                disc,
                reason,
                missing_discs: Vec::new(),
            }
        })
        .collect();

    (ready, held)
}

fn last_exported(tracker: &SeriesTracker) -> Option<DateTime<Utc>> {
    tracker
        .values()
        .filter(|r| r.last_episode > 0)
        .map(|r| r.last_exported_at)
        .max()
}

fn heuristic_label(kind: HeuristicKind) -> &'static str {
    match kind {
        HeuristicKind::H1 => "h1",
        HeuristicKind::H2 => "h2",
        HeuristicKind::H3 => "h3",
        HeuristicKind::Fallback => "fallback",
    }
}
