//! Types exchanged with the remote movie source.

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, Movie};
use crate::images::build_variants;

/// The ranked lists the remote source publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankedList {
    Popular,
    TopRated,
}

impl RankedList {
    /// The local category this list is stored as.
    pub fn category(&self) -> Category {
        match self {
            RankedList::Popular => Category::Popular,
            RankedList::TopRated => Category::HighestRated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankedList::Popular => "popular",
            RankedList::TopRated => "top_rated",
        }
    }
}

/// A movie as decoded from a ranked list, before image URLs are resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteMovieRecord {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub synopsis: String,
    /// Relative poster path, e.g. `/abc.jpg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_fragment: Option<String>,
    /// Relative backdrop path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_fragment: Option<String>,
}

impl RemoteMovieRecord {
    /// Build the stored movie, expanding image fragments to one URL per size.
    pub fn to_movie(&self, images: &ImageConfiguration) -> Movie {
        Movie {
            id: self.id,
            title: self.title.clone(),
            release_date: self.release_date.clone(),
            rating: self.rating,
            synopsis: self.synopsis.clone(),
            poster_variants: build_variants(
                &images.poster_base_urls,
                self.poster_fragment.as_deref(),
            ),
            backdrop_variants: build_variants(
                &images.backdrop_base_urls,
                self.backdrop_fragment.as_deref(),
            ),
        }
    }
}

/// Base URLs for every available image size, size segment included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageConfiguration {
    /// e.g. `https://image.tmdb.org/t/p/w185`
    pub poster_base_urls: Vec<String>,
    pub backdrop_base_urls: Vec<String>,
}

impl ImageConfiguration {
    /// Combine an image host base URL with the size tags it serves.
    pub fn from_sizes(base_url: &str, poster_sizes: &[String], backdrop_sizes: &[String]) -> Self {
        let base = base_url.trim_end_matches('/');
        let expand = |sizes: &[String]| -> Vec<String> {
            sizes
                .iter()
                .map(|size| format!("{}/{}", base, size))
                .collect()
        };

        Self {
            poster_base_urls: expand(poster_sizes),
            backdrop_base_urls: expand(backdrop_sizes),
        }
    }
}

/// A movie trailer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieVideo {
    pub name: String,
    /// Watch URL.
    pub url: String,
}

/// A user review of a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieReview {
    pub author: String,
    pub content: String,
    pub url: String,
}
