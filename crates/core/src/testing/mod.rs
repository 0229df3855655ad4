//! Testing utilities and mock implementations.
//!
//! This module provides a mock remote movie source plus fixtures, allowing
//! sync and API tests without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use marquee_core::testing::{fixtures, MockMovieSource};
//!
//! let source = MockMovieSource::new();
//! source.set_list(RankedList::Popular, vec![fixtures::record(1, "Logan")]).await;
//!
//! // Use in CatalogSync or AppState...
//! ```

mod mock_movie_source;

pub use mock_movie_source::{MockMovieSource, RecordedSourceQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::Movie;
    use crate::remote::{ImageConfiguration, MovieReview, MovieVideo, RemoteMovieRecord};

    /// Image host used by the fixtures.
    pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

    /// Image configuration with the usual TMDB sizes.
    pub fn image_configuration() -> ImageConfiguration {
        let sizes = |tags: &[&str]| -> Vec<String> { tags.iter().map(|t| t.to_string()).collect() };
        ImageConfiguration::from_sizes(
            IMAGE_BASE_URL,
            &sizes(&["w92", "w154", "w185", "w342", "w500", "w780", "original"]),
            &sizes(&["w300", "w780", "w1280", "original"]),
        )
    }

    /// Create a remote record with reasonable defaults.
    pub fn record(id: u32, title: &str) -> RemoteMovieRecord {
        RemoteMovieRecord {
            id,
            title: title.to_string(),
            release_date: "2017-03-01".to_string(),
            rating: 7.0 + (id % 30) as f64 / 10.0,
            synopsis: format!("A movie about {}.", title.to_lowercase()),
            poster_fragment: Some(format!("/poster-{}.jpg", id)),
            backdrop_fragment: Some(format!("/backdrop-{}.jpg", id)),
        }
    }

    /// Create a batch of records with ids `ids`, titled "Movie <id>".
    pub fn records(ids: &[u32]) -> Vec<RemoteMovieRecord> {
        ids.iter()
            .map(|id| record(*id, &format!("Movie {}", id)))
            .collect()
    }

    /// Create a stored movie as a sync would write it.
    pub fn movie(id: u32, title: &str) -> Movie {
        record(id, title).to_movie(&image_configuration())
    }

    /// Create a YouTube trailer.
    pub fn video(name: &str) -> MovieVideo {
        MovieVideo {
            name: name.to_string(),
            url: format!(
                "https://www.youtube.com/watch?v={}",
                name.to_lowercase().replace(' ', "-")
            ),
        }
    }

    /// Create a review.
    pub fn review(author: &str, content: &str) -> MovieReview {
        MovieReview {
            author: author.to_string(),
            content: content.to_string(),
            url: format!("https://www.themoviedb.org/review/{}", author.to_lowercase()),
        }
    }
}
