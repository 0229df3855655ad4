//! Sync scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the background sync scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Enable/disable the background scheduler.
    /// When disabled, syncs only happen through the API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Hours between periodic syncs.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// A periodic sync is skipped if another sync finished within this many hours.
    #[serde(default = "default_flex_hours")]
    pub flex_hours: u64,

    /// The catalog is considered stale after this many hours without a sync.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,

    /// Delay before retrying a failed sync (seconds).
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_hours() -> u64 {
    24
}

fn default_flex_hours() -> u64 {
    default_interval_hours() / 3
}

fn default_stale_after_hours() -> u64 {
    48
}

fn default_retry_interval() -> u64 {
    1800 // 30 minutes
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_hours: default_interval_hours(),
            flex_hours: default_flex_hours(),
            stale_after_hours: default_stale_after_hours(),
            retry_interval_secs: default_retry_interval(),
        }
    }
}

/// Scheduler timings as durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTimings {
    pub interval: Duration,
    pub flex: Duration,
    pub stale_after: Duration,
    pub retry_interval: Duration,
}

impl From<&SyncConfig> for SyncTimings {
    fn from(config: &SyncConfig) -> Self {
        const HOUR: u64 = 60 * 60;
        Self {
            interval: Duration::from_secs(config.interval_hours.saturating_mul(HOUR)),
            flex: Duration::from_secs(config.flex_hours.saturating_mul(HOUR)),
            stale_after: Duration::from_secs(config.stale_after_hours.saturating_mul(HOUR)),
            retry_interval: Duration::from_secs(config.retry_interval_secs),
        }
    }
}
