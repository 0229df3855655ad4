//! Catalog reconciliation.
//!
//! A sync replaces both ranked categories with fresh remote snapshots while
//! leaving favorites alone. The write side is a single batch:
//!
//! 1. clear the popular and highest rated memberships
//! 2. evict every movie that is no longer in any category
//! 3. upsert each popular record and add it to popular, in rank order
//! 4. same for the highest rated records
//! 5. record the sync time and commit
//!
//! Movies that stay favorites survive step 2, and step 3/4 refresh their
//! fields in place when they are still ranked.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, Category, CategoryStore};
use crate::metrics;
use crate::remote::{ImageConfiguration, MovieSource, RankedList, RemoteError, RemoteMovieRecord};

use super::types::{SyncError, SyncResult};

/// Drives catalog syncs against a [`MovieSource`].
///
/// At most one sync runs at a time; a second caller gets
/// [`SyncError::InProgress`] instead of waiting.
pub struct CatalogSync {
    store: Arc<dyn CategoryStore>,
    source: Arc<dyn MovieSource>,
    in_flight: Mutex<()>,
    cancelled: AtomicBool,
}

impl CatalogSync {
    pub fn new(store: Arc<dyn CategoryStore>, source: Arc<dyn MovieSource>) -> Self {
        Self {
            store,
            source,
            in_flight: Mutex::new(()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Fetch both ranked lists and reconcile the catalog with them.
    pub async fn sync(&self) -> Result<SyncResult, SyncError> {
        let _guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Rejecting sync, another one is running");
                metrics::SYNC_RUNS.with_label_values(&["in_progress"]).inc();
                return Err(SyncError::InProgress);
            }
        };

        let start = Instant::now();
        let result = self.run().await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(r) => {
                metrics::SYNC_RUNS.with_label_values(&["success"]).inc();
                metrics::SYNC_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);
                metrics::MOVIES_UPSERTED.inc_by(r.movies_upserted);
                metrics::ORPHANS_DELETED.inc_by(r.orphans_deleted);
                metrics::LAST_SYNC_TIMESTAMP.set(r.synced_at.timestamp());
                info!(
                    movies = r.movies_upserted,
                    popular = r.popular_count,
                    highest_rated = r.highest_rated_count,
                    evicted = r.orphans_deleted,
                    elapsed_secs = elapsed,
                    "Catalog sync completed"
                );
            }
            Err(e) => {
                metrics::SYNC_RUNS.with_label_values(&[e.kind()]).inc();
                metrics::SYNC_DURATION
                    .with_label_values(&[e.kind()])
                    .observe(elapsed);
                warn!("Catalog sync failed: {}", e);
            }
        }

        result
    }

    /// Whether a sync is executing right now.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Stop future syncs before they write anything.
    ///
    /// A sync already inside its write batch runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn run(&self) -> Result<SyncResult, SyncError> {
        self.check_cancelled()?;

        debug!("Fetching image configuration and ranked lists");
        let (images, popular, highest_rated) = futures::future::try_join3(
            fetch("configuration", self.source.fetch_image_configuration()),
            fetch(
                "popular list",
                self.source.fetch_ranked_list(RankedList::Popular),
            ),
            fetch(
                "top_rated list",
                self.source.fetch_ranked_list(RankedList::TopRated),
            ),
        )
        .await?;

        self.check_cancelled()?;

        // The write batch holds the store lock; keep it off the async workers.
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || {
            apply_ranked_lists(
                store.as_ref(),
                &popular,
                &highest_rated,
                &images,
                Utc::now(),
            )
        })
        .await
        .map_err(|e| CatalogError::Internal(format!("sync write task failed: {}", e)))??;

        Ok(result)
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

async fn fetch<T>(
    what: &'static str,
    request: impl Future<Output = Result<T, RemoteError>>,
) -> Result<T, SyncError> {
    match request.await {
        Ok(value) => {
            metrics::REMOTE_FETCHES
                .with_label_values(&[what, "success"])
                .inc();
            Ok(value)
        }
        Err(e) => {
            metrics::REMOTE_FETCHES
                .with_label_values(&[what, "error"])
                .inc();
            Err(SyncError::from_remote(what, e))
        }
    }
}

/// Replace both ranked categories with the given records in one write batch.
///
/// Records are stored in the order given; a movie repeated within one list
/// keeps the rank of its first occurrence. Favorites are never removed. If any
/// step fails the batch is rolled back and the catalog is unchanged.
pub fn apply_ranked_lists(
    store: &dyn CategoryStore,
    popular: &[RemoteMovieRecord],
    highest_rated: &[RemoteMovieRecord],
    images: &ImageConfiguration,
    now: DateTime<Utc>,
) -> Result<SyncResult, CatalogError> {
    let mut writer = store.begin()?;

    for category in Category::REFRESHABLE {
        let cleared = writer.clear_category(category)?;
        debug!("Cleared {} memberships from {}", cleared, category);
    }

    // Movies about to be re-listed are refreshed in place, not evicted.
    let listed: Vec<u32> = popular
        .iter()
        .chain(highest_rated)
        .map(|record| record.id)
        .collect();
    let orphans_deleted = writer.delete_orphan_movies_except(&listed)?;

    let mut upserted = HashSet::new();
    let mut memberships_written = 0;
    let mut counts = [0u64; 2];

    let lists = [
        (RankedList::Popular, popular),
        (RankedList::TopRated, highest_rated),
    ];
    for (count, (list, records)) in counts.iter_mut().zip(lists) {
        let category = list.category();
        for record in records {
            writer.upsert_movie(&record.to_movie(images))?;
            upserted.insert(record.id);

            if writer.add_membership(category, record.id)? {
                *count += 1;
                memberships_written += 1;
            } else {
                debug!("Movie {} listed twice in {}, keeping first rank", record.id, category);
            }
        }
    }

    writer.set_last_synced_at(now)?;
    writer.commit()?;

    Ok(SyncResult {
        movies_upserted: upserted.len() as u64,
        memberships_written,
        orphans_deleted,
        popular_count: counts[0],
        highest_rated_count: counts[1],
        synced_at: now,
    })
}
