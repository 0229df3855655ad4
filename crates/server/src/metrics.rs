//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the marquee server:
//! - HTTP request metrics (latency, counts)
//! - Catalog size per category and sync status (collected dynamically)
//! - Sync, favorite and remote fetch metrics from `marquee_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use marquee_core::Category;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "marquee_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Members per category.
pub static CATEGORY_MEMBERS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("marquee_category_members", "Number of movies per category"),
        &["category"],
    )
    .unwrap()
});

/// Stored movie rows.
pub static CATALOG_MOVIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("marquee_catalog_movies", "Number of stored movies").unwrap()
});

/// Whether a sync is currently running (1) or not (0).
pub static SYNC_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("marquee_sync_in_progress", "Whether a catalog sync is running").unwrap()
});

/// Whether the background scheduler is running (1) or not (0).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_scheduler_running",
        "Whether the sync scheduler is running",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Catalog
    registry
        .register(Box::new(CATEGORY_MEMBERS.clone()))
        .unwrap();
    registry
        .register(Box::new(CATALOG_MOVIES.clone()))
        .unwrap();
    registry
        .register(Box::new(SYNC_IN_PROGRESS.clone()))
        .unwrap();
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();

    // Core metrics (sync, favorites, remote source)
    for metric in marquee_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the catalog as it is now.
pub fn collect_dynamic_metrics(state: &AppState) {
    SYNC_IN_PROGRESS.set(state.sync().is_syncing() as i64);
    SCHEDULER_RUNNING.set(
        state
            .scheduler()
            .map(|s| s.is_running() as i64)
            .unwrap_or(0),
    );

    match state.catalog().stats() {
        Ok(stats) => {
            CATALOG_MOVIES.set(stats.total_movies as i64);
            for (category, count) in [
                (Category::Popular, stats.popular),
                (Category::HighestRated, stats.highest_rated),
                (Category::Favorite, stats.favorites),
            ] {
                CATEGORY_MEMBERS
                    .with_label_values(&[category.as_str()])
                    .set(count as i64);
            }
        }
        Err(e) => warn!("Failed to read catalog stats for metrics: {}", e),
    }
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace movie ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    // Run twice: adjacent numeric segments share a slash.
    let result = NUMERIC_SEGMENT.replace_all(path, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
