pub mod batch;
pub mod catalog;
pub mod config;
pub mod correlation;
pub mod disc;
pub mod exporter;
pub mod metrics;
pub mod scheduler;
pub mod testing;
pub mod tracker;
pub mod volume_label;

pub use batch::{
    analyze, assign, BatchAnalysis, DiscJob, EpisodeAssignment, EpisodeSlot, WaitingDisc,
};
pub use catalog::{
    CatalogError, EpisodeCatalogSource, SeasonEntry, SeriesEpisodeCatalog, TmdbCatalogSource,
    TmdbConfig,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LibraryConfig,
    SanitizedConfig,
};
pub use correlation::{correlate, CorrelationResult, Heuristic, HeuristicKind};
pub use disc::{
    discover_discs, extract_episodes, DiscEpisodeExtraction, DiscScanner, DiscoveredDisc,
    EpisodeDurationRange, MakeMkvScanner, ScannerConfig, ScannerError, TitleInfo,
};
pub use exporter::{
    FsTransfer, MakeMkvRemuxer, RemuxError, Remuxer, RemuxerConfig, Transfer, TransferConfig,
    TransferError,
};
pub use scheduler::{
    BatchReport, DiscJobState, ExportScheduler, JobStatus, QueueStatus, RetryConfig,
    SchedulerConfig, SchedulerDeps, SchedulerError, SchedulerStatus, SeriesBatchStatus,
};
pub use tracker::{FileTrackerStore, SeasonTrackerRecord, SeriesTracker, TrackerError, TrackerStore};
pub use volume_label::VolumeLabelHint;
