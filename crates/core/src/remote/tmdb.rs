//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Only the first results page of each ranked list is fetched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ImageConfiguration, MovieReview, MovieVideo, RankedList, RemoteMovieRecord};
use super::{MovieSource, RemoteError};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// TMDB status code for an invalid API key.
const STATUS_INVALID_API_KEY: i32 = 7;
/// TMDB status code for a missing resource.
const STATUS_RESOURCE_NOT_FOUND: i32 = 34;

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Response language for titles and synopses.
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, RemoteError> {
        if config.api_key.is_empty() {
            return Err(RemoteError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            language: config.language,
        })
    }

    /// GET a TMDB endpoint and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimitExceeded);
        }

        let body = response.text().await?;
        if let Some(err) = classify_failure(status, &body, what) {
            return Err(err);
        }

        serde_json::from_str(&body)
            .map_err(|e| RemoteError::Parse(format!("Failed to parse {} response: {}", what, e)))
    }
}

/// Map a TMDB error response to a [`RemoteError`].
///
/// TMDB reports key and lookup failures with a `status_code` in the body,
/// which takes precedence over the HTTP status.
fn classify_failure(status: StatusCode, body: &str, what: &str) -> Option<RemoteError> {
    if let Ok(tmdb_status) = serde_json::from_str::<TmdbStatus>(body) {
        let message = tmdb_status.status_message.unwrap_or_default();
        match tmdb_status.status_code {
            STATUS_INVALID_API_KEY => return Some(RemoteError::NotConfigured(message)),
            STATUS_RESOURCE_NOT_FOUND => return Some(RemoteError::NotFound(what.to_string())),
            _ => {}
        }
    }

    if status == StatusCode::UNAUTHORIZED {
        return Some(RemoteError::NotConfigured(
            "Invalid TMDB API key".to_string(),
        ));
    }
    if status == StatusCode::NOT_FOUND {
        return Some(RemoteError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        return Some(RemoteError::Api {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }

    None
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn fetch_ranked_list(
        &self,
        list: RankedList,
    ) -> Result<Vec<RemoteMovieRecord>, RemoteError> {
        debug!("TMDB ranked list: list={}", list.as_str());

        let page: TmdbPage<TmdbMovieResult> = self
            .get_json(
                &format!("/movie/{}", list.as_str()),
                &[("language", self.language.as_str()), ("page", "1")],
                &format!("{} list", list.as_str()),
            )
            .await?;

        Ok(page.results.into_iter().map(|r| r.into()).collect())
    }

    async fn fetch_image_configuration(&self) -> Result<ImageConfiguration, RemoteError> {
        debug!("TMDB image configuration");

        let config: TmdbConfiguration = self
            .get_json("/configuration", &[], "configuration")
            .await?;

        config.images.try_into()
    }

    async fn fetch_videos(&self, movie_id: u32) -> Result<Vec<MovieVideo>, RemoteError> {
        debug!("TMDB videos: id={}", movie_id);

        let videos: TmdbResults<TmdbVideoResult> = self
            .get_json(
                &format!("/movie/{}/videos", movie_id),
                &[("language", self.language.as_str())],
                &format!("Videos of movie {}", movie_id),
            )
            .await?;

        Ok(videos
            .results
            .into_iter()
            .filter_map(TmdbVideoResult::into_youtube)
            .collect())
    }

    async fn fetch_reviews(&self, movie_id: u32) -> Result<Vec<MovieReview>, RemoteError> {
        debug!("TMDB reviews: id={}", movie_id);

        let reviews: TmdbResults<TmdbReviewResult> = self
            .get_json(
                &format!("/movie/{}/reviews", movie_id),
                &[("language", self.language.as_str()), ("page", "1")],
                &format!("Reviews of movie {}", movie_id),
            )
            .await?;

        Ok(reviews.results.into_iter().map(|r| r.into()).collect())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbStatus {
    status_code: i32,
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbPage<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbResults<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbConfiguration {
    images: TmdbImagesConfig,
}

#[derive(Debug, Deserialize)]
struct TmdbImagesConfig {
    base_url: Option<String>,
    secure_base_url: Option<String>,
    #[serde(default)]
    poster_sizes: Vec<String>,
    #[serde(default)]
    backdrop_sizes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideoResult {
    key: String,
    name: String,
    site: String,
}

#[derive(Debug, Deserialize)]
struct TmdbReviewResult {
    author: String,
    content: String,
    url: String,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbMovieResult> for RemoteMovieRecord {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            release_date: r.release_date.unwrap_or_default(),
            rating: r.vote_average.unwrap_or(0.0),
            synopsis: r.overview.unwrap_or_default(),
            poster_fragment: r.poster_path,
            backdrop_fragment: r.backdrop_path,
        }
    }
}

impl TryFrom<TmdbImagesConfig> for ImageConfiguration {
    type Error = RemoteError;

    fn try_from(images: TmdbImagesConfig) -> Result<Self, Self::Error> {
        let base_url = images
            .secure_base_url
            .or(images.base_url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| RemoteError::Parse("configuration has no image base URL".to_string()))?;

        if images.poster_sizes.is_empty() {
            return Err(RemoteError::Parse(
                "configuration has no poster sizes".to_string(),
            ));
        }
        if images.backdrop_sizes.is_empty() {
            return Err(RemoteError::Parse(
                "configuration has no backdrop sizes".to_string(),
            ));
        }

        Ok(ImageConfiguration::from_sizes(
            &base_url,
            &images.poster_sizes,
            &images.backdrop_sizes,
        ))
    }
}

impl TmdbVideoResult {
    fn into_youtube(self) -> Option<MovieVideo> {
        if self.site != "YouTube" {
            return None;
        }
        Some(MovieVideo {
            name: self.name,
            url: format!("{}{}", YOUTUBE_WATCH_URL, self.key),
        })
    }
}

impl From<TmdbReviewResult> for MovieReview {
    fn from(r: TmdbReviewResult) -> Self {
        Self {
            author: r.author,
            content: r.content,
            url: r.url,
        }
    }
}
