//! Types for catalog sync and favorites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::remote::RemoteError;

/// Outcome of a successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Distinct movies inserted or refreshed.
    pub movies_upserted: u64,
    /// Category memberships written across both ranked lists.
    pub memberships_written: u64,
    /// Non-favorite movies evicted because they left both lists.
    pub orphans_deleted: u64,
    /// Movies now in the popular category.
    pub popular_count: u64,
    /// Movies now in the highest rated category.
    pub highest_rated_count: u64,
    /// When the sync committed.
    pub synced_at: DateTime<Utc>,
}

/// Errors that can occur during a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another sync is running in this process.
    #[error("a catalog sync is already in progress")]
    InProgress,

    /// A remote fetch failed before anything was written.
    #[error("failed to fetch {what}: {source}")]
    Network {
        what: String,
        #[source]
        source: RemoteError,
    },

    /// A remote response could not be decoded.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: RemoteError,
    },

    /// The write batch failed and was rolled back.
    #[error("catalog storage error: {0}")]
    Storage(#[from] CatalogError),

    /// The engine was cancelled before the write batch began.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Wrap a remote failure, keeping decode failures apart from transport ones.
    pub fn from_remote(what: impl Into<String>, source: RemoteError) -> Self {
        let what = what.into();
        if source.is_decode() {
            SyncError::Decode { what, source }
        } else {
            SyncError::Network { what, source }
        }
    }

    /// Whether trying again later can succeed without outside intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { source, .. } => {
                !matches!(source, RemoteError::NotConfigured(_))
            }
            SyncError::Storage(_) => true,
            SyncError::InProgress | SyncError::Decode { .. } | SyncError::Cancelled => false,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::InProgress => "in_progress",
            SyncError::Network { .. } => "network",
            SyncError::Decode { .. } => "decode",
            SyncError::Storage(_) => "storage",
            SyncError::Cancelled => "cancelled",
        }
    }
}

/// Favorite status of a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteState {
    NotFavorite,
    Favorite,
}

impl FavoriteState {
    pub fn is_favorite(&self) -> bool {
        matches!(self, FavoriteState::Favorite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteState::NotFavorite => "not_favorite",
            FavoriteState::Favorite => "favorite",
        }
    }
}

impl From<bool> for FavoriteState {
    fn from(favorite: bool) -> Self {
        if favorite {
            FavoriteState::Favorite
        } else {
            FavoriteState::NotFavorite
        }
    }
}

/// Why a sync was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncReason {
    /// Never synced, or the last sync is too old.
    Stale,
    /// The catalog has no movies.
    Empty,
    /// Regular interval elapsed.
    Periodic,
    /// Explicitly requested.
    Manual,
    /// Retrying after a failed attempt.
    Retry,
}

/// What the startup check decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    SyncNow(SyncReason),
    Skip,
}

/// Current status of the sync scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the background loop is running.
    pub running: bool,
    /// Whether a sync is executing right now.
    pub sync_in_progress: bool,
    /// When the scheduler last attempted a sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Result of the last successful scheduled sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<SyncResult>,
    /// Error of the last attempt, cleared by the next success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
