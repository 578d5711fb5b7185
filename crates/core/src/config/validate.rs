use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Watch and output directories differ
/// - Scheduler parallelism and poll interval are non-zero
/// - Auto-export confidence lies in [0, 1]
/// - Episode duration window is non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Library validation
    if config.library.watch_dir == config.library.output_dir {
        return Err(ConfigError::ValidationError(
            "library.watch_dir and library.output_dir must differ".to_string(),
        ));
    }

    // Scheduler validation
    let scheduler = &config.scheduler;
    if scheduler.max_parallel_exports == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.max_parallel_exports must be at least 1".to_string(),
        ));
    }
    if scheduler.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.poll_interval_secs cannot be 0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&scheduler.auto_export_min_confidence) {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.auto_export_min_confidence must be within [0, 1], got {}",
            scheduler.auto_export_min_confidence
        )));
    }

    // Scanner validation
    if config.scanner.min_episode_minutes >= config.scanner.max_episode_minutes {
        return Err(ConfigError::ValidationError(format!(
            "scanner.min_episode_minutes ({}) must be below max_episode_minutes ({})",
            config.scanner.min_episode_minutes, config.scanner.max_episode_minutes
        )));
    }

    Ok(())
}
