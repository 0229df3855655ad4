//! Remote movie source integration.
//!
//! The catalog is filled from a remote ranked-list service. [`MovieSource`]
//! is the seam the sync engine talks to; [`TmdbClient`] is the production
//! implementation.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the remote movie source.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing or rejected API key).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl RemoteError {
    /// Whether the response arrived but could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, RemoteError::Parse(_))
    }
}

/// Source of ranked movie lists and image configuration.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Fetch the first page of a ranked list, in remote rank order.
    async fn fetch_ranked_list(
        &self,
        list: RankedList,
    ) -> Result<Vec<RemoteMovieRecord>, RemoteError>;

    /// Fetch the base URLs used to turn image fragments into full URLs.
    async fn fetch_image_configuration(&self) -> Result<ImageConfiguration, RemoteError>;

    /// Fetch the trailers of a movie.
    async fn fetch_videos(&self, movie_id: u32) -> Result<Vec<MovieVideo>, RemoteError>;

    /// Fetch the user reviews of a movie.
    async fn fetch_reviews(&self, movie_id: u32) -> Result<Vec<MovieReview>, RemoteError>;
}
