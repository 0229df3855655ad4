use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::debug;

use super::{types::Config, ConfigError};

/// Prefix of environment variables overriding file settings,
/// e.g. `MARQUEE_TMDB__API_KEY` or `MARQUEE_SYNC__INTERVAL_HOURS`.
pub const ENV_PREFIX: &str = "MARQUEE_";

/// Layered sources: the TOML file, then `MARQUEE_*` environment variables.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(figment(path))
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    extract(Figment::from(Toml::string(toml_str)))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    let config: Config = figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    debug!(
        database = %config.database.path.display(),
        sync_enabled = config.sync.enabled,
        "Configuration extracted"
    );
    Ok(config)
}
