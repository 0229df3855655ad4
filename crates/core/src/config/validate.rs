use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - TMDB section exists (enforced by serde) and has an API key
/// - Server port is not 0
/// - Sync intervals are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // TMDB validation
    if config.tmdb.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "tmdb.api_key cannot be empty".to_string(),
        ));
    }
    if config.tmdb.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tmdb.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Sync validation
    let sync = &config.sync;
    if sync.interval_hours == 0 {
        return Err(ConfigError::ValidationError(
            "sync.interval_hours cannot be 0".to_string(),
        ));
    }
    if sync.flex_hours >= sync.interval_hours {
        return Err(ConfigError::ValidationError(format!(
            "sync.flex_hours ({}) must be less than sync.interval_hours ({})",
            sync.flex_hours, sync.interval_hours
        )));
    }
    if sync.retry_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sync.retry_interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
