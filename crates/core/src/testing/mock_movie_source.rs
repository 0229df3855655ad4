//! Mock movie source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::remote::{
    ImageConfiguration, MovieReview, MovieSource, MovieVideo, RankedList, RemoteError,
    RemoteMovieRecord,
};

use super::fixtures;

/// A recorded source request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedSourceQuery {
    RankedList(RankedList),
    ImageConfiguration,
    Videos { movie_id: u32 },
    Reviews { movie_id: u32 },
}

/// Mock implementation of the MovieSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable ranked lists, videos and reviews
/// - Track requests for assertions
/// - Simulate failures, globally or per ranked list
/// - Slow down ranked list fetches to hold a sync in flight
///
/// # Example
///
/// ```rust,ignore
/// use marquee_core::testing::{MockMovieSource, fixtures};
///
/// let source = MockMovieSource::new();
/// source.set_list(RankedList::Popular, vec![fixtures::record(1, "Logan")]).await;
/// source.fail_list(RankedList::TopRated, RemoteError::RateLimitExceeded).await;
/// ```
#[derive(Debug)]
pub struct MockMovieSource {
    /// Ranked list contents.
    lists: Arc<RwLock<HashMap<RankedList, Vec<RemoteMovieRecord>>>>,
    /// Image configuration returned to every caller.
    images: Arc<RwLock<ImageConfiguration>>,
    /// Videos by movie id.
    videos: Arc<RwLock<HashMap<u32, Vec<MovieVideo>>>>,
    /// Reviews by movie id.
    reviews: Arc<RwLock<HashMap<u32, Vec<MovieReview>>>>,
    /// Recorded requests.
    queries: Arc<RwLock<Vec<RecordedSourceQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<RemoteError>>>,
    /// Per-list failures, consumed by the next fetch of that list.
    list_errors: Arc<RwLock<HashMap<RankedList, RemoteError>>>,
    /// Delay applied to ranked list fetches.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockMovieSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMovieSource {
    /// Create a new mock with empty lists and the fixture image configuration.
    pub fn new() -> Self {
        Self {
            lists: Arc::new(RwLock::new(HashMap::new())),
            images: Arc::new(RwLock::new(fixtures::image_configuration())),
            videos: Arc::new(RwLock::new(HashMap::new())),
            reviews: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            list_errors: Arc::new(RwLock::new(HashMap::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Content Configuration
    // =========================================================================

    /// Replace the contents of a ranked list.
    pub async fn set_list(&self, list: RankedList, records: Vec<RemoteMovieRecord>) {
        self.lists.write().await.insert(list, records);
    }

    /// Replace the image configuration.
    pub async fn set_image_configuration(&self, images: ImageConfiguration) {
        *self.images.write().await = images;
    }

    /// Set the videos of a movie.
    pub async fn set_videos(&self, movie_id: u32, videos: Vec<MovieVideo>) {
        self.videos.write().await.insert(movie_id, videos);
    }

    /// Set the reviews of a movie.
    pub async fn set_reviews(&self, movie_id: u32, reviews: Vec<MovieReview>) {
        self.reviews.write().await.insert(movie_id, reviews);
    }

    /// Delay every ranked list fetch by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded requests.
    pub async fn recorded_queries(&self) -> Vec<RecordedSourceQuery> {
        self.queries.read().await.clone()
    }

    /// Get the number of requests performed.
    pub async fn fetch_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: RemoteError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next fetch of `list` to fail with the given error.
    pub async fn fail_list(&self, list: RankedList, error: RemoteError) {
        self.list_errors.write().await.insert(list, error);
    }

    /// Clear any pending errors.
    pub async fn clear_errors(&self) {
        *self.next_error.write().await = None;
        self.list_errors.write().await.clear();
    }

    async fn take_error(&self) -> Option<RemoteError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, query: RecordedSourceQuery) {
        self.queries.write().await.push(query);
    }
}

#[async_trait]
impl MovieSource for MockMovieSource {
    async fn fetch_ranked_list(
        &self,
        list: RankedList,
    ) -> Result<Vec<RemoteMovieRecord>, RemoteError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedSourceQuery::RankedList(list)).await;

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.list_errors.write().await.remove(&list) {
            return Err(err);
        }

        Ok(self
            .lists
            .read()
            .await
            .get(&list)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_image_configuration(&self) -> Result<ImageConfiguration, RemoteError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedSourceQuery::ImageConfiguration).await;

        Ok(self.images.read().await.clone())
    }

    async fn fetch_videos(&self, movie_id: u32) -> Result<Vec<MovieVideo>, RemoteError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedSourceQuery::Videos { movie_id }).await;

        self.videos
            .read()
            .await
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("Videos of movie {}", movie_id)))
    }

    async fn fetch_reviews(&self, movie_id: u32) -> Result<Vec<MovieReview>, RemoteError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedSourceQuery::Reviews { movie_id }).await;

        self.reviews
            .read()
            .await
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("Reviews of movie {}", movie_id)))
    }
}
