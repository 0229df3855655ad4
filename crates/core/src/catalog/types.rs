//! Types for the movie catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A movie as stored in the local catalog.
///
/// Identity is the remote id alone. Two movies with the same id are the same
/// movie even when every other field differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Remote (TMDB) movie id.
    pub id: u32,
    /// Movie title.
    pub title: String,
    /// Release date (YYYY-MM-DD or YYYY-MM).
    pub release_date: String,
    /// Average vote (0-10).
    pub rating: f64,
    /// Plot synopsis.
    pub synopsis: String,
    /// Poster URLs, one per available size.
    #[serde(default)]
    pub poster_variants: Vec<String>,
    /// Backdrop URLs, one per available size.
    #[serde(default)]
    pub backdrop_variants: Vec<String>,
}

impl Movie {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .split('-')
            .next()
            .and_then(|y| y.parse().ok())
    }
}

/// The lists a movie can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Remote "popular" ranking.
    Popular,
    /// Remote "top rated" ranking.
    HighestRated,
    /// User-curated favorites. Never touched by sync.
    Favorite,
}

impl Category {
    /// Categories rebuilt from the remote service on every sync.
    pub const REFRESHABLE: [Category; 2] = [Category::Popular, Category::HighestRated];

    /// Name of the membership table backing this category.
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Popular => "popular_movies",
            Category::HighestRated => "highest_rated_movies",
            Category::Favorite => "favorite_movies",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::HighestRated => "highest_rated",
            Category::Favorite => "favorite",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(Category::Popular),
            "highest_rated" | "top_rated" => Ok(Category::HighestRated),
            "favorite" | "favorites" => Ok(Category::Favorite),
            other => Err(CatalogError::NotFound(format!("category '{}'", other))),
        }
    }
}

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total stored movie rows.
    pub total_movies: u64,
    /// Popular memberships.
    pub popular: u64,
    /// Highest rated memberships.
    pub highest_rated: u64,
    /// Favorite memberships.
    pub favorites: u64,
    /// When the last successful sync committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A membership was written for a movie row that does not exist.
    #[error("Movie {movie_id} does not exist, cannot add it to {category}")]
    ReferentialIntegrity { category: Category, movie_id: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::Database(e.to_string())
    }
}
