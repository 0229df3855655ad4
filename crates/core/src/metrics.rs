//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog sync (runs, durations, movies written, orphans evicted)
//! - Favorites (toggles by resulting state)
//! - Remote movie source requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Sync Metrics
// =============================================================================

/// Sync runs total by result.
pub static SYNC_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_sync_runs_total", "Total catalog sync runs"),
        &["result"], // "success", "in_progress", "network", "decode", "storage", "cancelled"
    )
    .unwrap()
});

/// Sync duration in seconds.
pub static SYNC_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("marquee_sync_duration_seconds", "Duration of catalog syncs")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Movie rows written by syncs.
pub static MOVIES_UPSERTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_movies_upserted_total",
        "Total movie rows inserted or updated by sync",
    )
    .unwrap()
});

/// Movies evicted because they left every category.
pub static ORPHANS_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_orphans_deleted_total",
        "Total movies evicted by sync",
    )
    .unwrap()
});

/// Unix time of the last successful sync.
pub static LAST_SYNC_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_last_sync_timestamp_seconds",
        "Unix time of the last successful catalog sync",
    )
    .unwrap()
});

// =============================================================================
// Favorite Metrics
// =============================================================================

/// Favorite toggles by resulting state.
pub static FAVORITE_TOGGLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_favorite_toggles_total", "Total favorite changes"),
        &["state"], // "favorite", "not_favorite", "failed"
    )
    .unwrap()
});

// =============================================================================
// Remote Source Metrics
// =============================================================================

/// Remote source fetches total.
pub static REMOTE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_remote_fetches_total",
            "Total remote movie source fetches",
        ),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sync
        Box::new(SYNC_RUNS.clone()),
        Box::new(SYNC_DURATION.clone()),
        Box::new(MOVIES_UPSERTED.clone()),
        Box::new(ORPHANS_DELETED.clone()),
        Box::new(LAST_SYNC_TIMESTAMP.clone()),
        // Favorites
        Box::new(FAVORITE_TOGGLES.clone()),
        // Remote source
        Box::new(REMOTE_FETCHES.clone()),
    ]
}
