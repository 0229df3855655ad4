//! Background sync scheduling.
//!
//! On start the scheduler checks whether the catalog needs an immediate
//! refresh, then syncs on a fixed interval. A periodic run is skipped when a
//! sync already succeeded within the flex window, and a retryable failure is
//! retried after a shorter delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Notify, RwLock};
use tracing::{debug, error, info, warn};

use crate::catalog::CategoryStore;

use super::config::SyncTimings;
use super::engine::CatalogSync;
use super::types::{SchedulerStatus, SyncDecision, SyncError, SyncReason, SyncResult};

/// Decides when the catalog needs refreshing.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    stale_after: chrono::Duration,
    flex: chrono::Duration,
}

impl SyncPolicy {
    pub fn new(stale_after: Duration, flex: Duration) -> Self {
        Self {
            stale_after: to_chrono(stale_after),
            flex: to_chrono(flex),
        }
    }

    /// Startup check. Staleness is checked before emptiness.
    pub fn decide(
        &self,
        last_synced_at: Option<DateTime<Utc>>,
        catalog_empty: bool,
        now: DateTime<Utc>,
    ) -> SyncDecision {
        match last_synced_at {
            None => return SyncDecision::SyncNow(SyncReason::Stale),
            Some(last) if now - last > self.stale_after => {
                return SyncDecision::SyncNow(SyncReason::Stale)
            }
            Some(_) => {}
        }

        if catalog_empty {
            return SyncDecision::SyncNow(SyncReason::Empty);
        }

        SyncDecision::Skip
    }

    /// Whether a periodic tick should sync, given the last successful sync.
    pub fn periodic_due(&self, last_synced_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_synced_at {
            None => true,
            Some(last) => now - last >= self.flex,
        }
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::days(36_500))
}

#[derive(Debug, Default)]
struct SchedulerState {
    last_attempt_at: Option<DateTime<Utc>>,
    last_result: Option<SyncResult>,
    last_error: Option<String>,
}

/// Runs [`CatalogSync`] in the background.
pub struct SyncScheduler {
    engine: Arc<CatalogSync>,
    store: Arc<dyn CategoryStore>,
    timings: SyncTimings,
    policy: SyncPolicy,

    // Runtime state
    running: Arc<AtomicBool>,
    state: Arc<RwLock<SchedulerState>>,
    trigger: Arc<Notify>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SyncScheduler {
    /// Create a new scheduler.
    pub fn new(
        engine: Arc<CatalogSync>,
        store: Arc<dyn CategoryStore>,
        timings: SyncTimings,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            engine,
            store,
            timings,
            policy: SyncPolicy::new(timings.stale_after, timings.flex),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(RwLock::new(SchedulerState::default())),
            trigger: Arc::new(Notify::new()),
            shutdown_tx,
        }
    }

    /// Start the scheduler (spawns the background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync scheduler already running");
            return;
        }

        info!(
            interval_secs = self.timings.interval.as_secs(),
            flex_secs = self.timings.flex.as_secs(),
            "Starting sync scheduler"
        );

        self.spawn_loop();
    }

    /// Stop the scheduler. A sync already running finishes first.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Sync scheduler not running");
            return;
        }

        info!("Stopping sync scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Ask the background loop to sync as soon as possible.
    pub fn trigger(&self) {
        debug!("Sync triggered");
        self.trigger.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        let state = self.state.read().await;

        SchedulerStatus {
            running: self.is_running(),
            sync_in_progress: self.engine.is_syncing(),
            last_attempt_at: state.last_attempt_at,
            last_result: state.last_result.clone(),
            last_error: state.last_error.clone(),
        }
    }

    fn spawn_loop(&self) {
        let running = Arc::clone(&self.running);
        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let trigger = Arc::clone(&self.trigger);
        let timings = self.timings;
        let policy = self.policy;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Sync loop started");

            let mut pending = match startup_decision(store.as_ref(), &policy) {
                SyncDecision::SyncNow(reason) => Some(reason),
                SyncDecision::Skip => None,
            };
            let mut retry = false;

            loop {
                if let Some(reason) = pending.take() {
                    retry = match run_once(&engine, &state, reason).await {
                        Err(e) if e.is_retryable() => {
                            warn!(
                                retry_in_secs = timings.retry_interval.as_secs(),
                                "Scheduled sync failed, will retry: {}", e
                            );
                            true
                        }
                        _ => false,
                    };
                }

                let delay = if retry {
                    timings.retry_interval
                } else {
                    timings.interval
                };

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Sync loop received shutdown signal");
                        break;
                    }
                    _ = trigger.notified() => {
                        pending = Some(SyncReason::Manual);
                    }
                    _ = tokio::time::sleep(delay) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        if retry {
                            pending = Some(SyncReason::Retry);
                            continue;
                        }
                        let last = store.last_synced_at().unwrap_or_else(|e| {
                            warn!("Failed to read last sync time: {}", e);
                            None
                        });
                        if policy.periodic_due(last, Utc::now()) {
                            pending = Some(SyncReason::Periodic);
                        } else {
                            debug!("Skipping periodic sync, catalog refreshed recently");
                        }
                    }
                }
            }

            info!("Sync loop stopped");
        });
    }
}

fn startup_decision(store: &dyn CategoryStore, policy: &SyncPolicy) -> SyncDecision {
    let stats = match store.stats() {
        Ok(stats) => stats,
        Err(e) => {
            error!("Failed to read catalog state, syncing anyway: {}", e);
            return SyncDecision::SyncNow(SyncReason::Stale);
        }
    };

    let decision = policy.decide(stats.last_synced_at, stats.total_movies == 0, Utc::now());
    debug!("Startup sync decision: {:?}", decision);
    decision
}

async fn run_once(
    engine: &CatalogSync,
    state: &RwLock<SchedulerState>,
    reason: SyncReason,
) -> Result<(), SyncError> {
    info!(reason = ?reason, "Running scheduled sync");
    state.write().await.last_attempt_at = Some(Utc::now());

    match engine.sync().await {
        Ok(result) => {
            let mut state = state.write().await;
            state.last_result = Some(result);
            state.last_error = None;
            Ok(())
        }
        Err(SyncError::InProgress) => {
            debug!("Scheduled sync skipped, another sync is running");
            Ok(())
        }
        Err(e) => {
            state.write().await.last_error = Some(e.to_string());
            Err(e)
        }
    }
}
