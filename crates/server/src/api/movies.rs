//! Category, movie and favorite handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use marquee_core::{
    resolve_image_path, CatalogError, Category, FavoriteState, Movie, MovieReview, MovieVideo,
    RemoteError,
};

use super::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub category: Category,
    pub movies: Vec<Movie>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageWidthParams {
    /// Minimum poster width; the smallest larger variant is returned.
    #[serde(default)]
    pub poster_width: Option<u32>,
    #[serde(default)]
    pub backdrop_width: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub movie_id: u32,
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteChangeResponse {
    pub movie_id: u32,
    pub state: FavoriteState,
}

#[derive(Debug, Deserialize)]
pub struct SetFavoriteRequest {
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub movie_id: u32,
    pub videos: Vec<MovieVideo>,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub movie_id: u32,
    pub reviews: Vec<MovieReview>,
}

fn catalog_error(e: CatalogError) -> ApiError {
    let status = match &e {
        CatalogError::NotFound(_) | CatalogError::ReferentialIntegrity { .. } => {
            StatusCode::NOT_FOUND
        }
        CatalogError::Database(_) | CatalogError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e)
}

fn remote_error(e: RemoteError) -> ApiError {
    let status = match &e {
        RemoteError::NotFound(_) => StatusCode::NOT_FOUND,
        RemoteError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    };
    api_error(status, e)
}

/// Run a catalog write on the blocking pool; it may wait on a sync's batch.
async fn blocking<T, F>(write: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, CatalogError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(write)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(catalog_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/categories/{category}
///
/// List the members of a category in rank (or favoriting) order.
pub async fn list_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let category: Category = category.parse().map_err(catalog_error)?;
    let movies = state.catalog().list_members(category).map_err(catalog_error)?;
    let total = movies.len();

    Ok(Json(CategoryListResponse {
        category,
        movies,
        total,
    }))
}

/// GET /api/v1/movies/{id}
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Query(params): Query<ImageWidthParams>,
) -> Result<Json<MovieResponse>, ApiError> {
    let movie = state.catalog().get_movie(id).map_err(catalog_error)?;
    let favorite = state.favorites().is_favorite(id).map_err(catalog_error)?;

    let poster_url = params
        .poster_width
        .and_then(|w| resolve_image_path(&movie.poster_variants, w))
        .map(str::to_string);
    let backdrop_url = params
        .backdrop_width
        .and_then(|w| resolve_image_path(&movie.backdrop_variants, w))
        .map(str::to_string);

    Ok(Json(MovieResponse {
        year: movie.year(),
        movie,
        favorite,
        poster_url,
        backdrop_url,
    }))
}

/// GET /api/v1/movies/{id}/favorite
pub async fn get_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let favorite = state.favorites().is_favorite(id).map_err(catalog_error)?;
    Ok(Json(FavoriteResponse {
        movie_id: id,
        favorite,
    }))
}

/// POST /api/v1/movies/{id}/favorite
///
/// Flip the favorite state. Unknown movies are 404.
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<FavoriteChangeResponse>, ApiError> {
    let new_state = blocking(move || state.favorites().toggle(id)).await?;
    Ok(Json(FavoriteChangeResponse {
        movie_id: id,
        state: new_state,
    }))
}

/// PUT /api/v1/movies/{id}/favorite
pub async fn set_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(request): Json<SetFavoriteRequest>,
) -> Result<Json<FavoriteChangeResponse>, ApiError> {
    let new_state = blocking(move || state.favorites().set(id, request.favorite)).await?;
    Ok(Json(FavoriteChangeResponse {
        movie_id: id,
        state: new_state,
    }))
}

/// GET /api/v1/movies/{id}/videos
///
/// Trailers, fetched from the remote source on every call.
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<VideosResponse>, ApiError> {
    debug!(movie_id = id, "Fetching videos");
    let videos = state.source().fetch_videos(id).await.map_err(remote_error)?;
    Ok(Json(VideosResponse {
        movie_id: id,
        videos,
    }))
}

/// GET /api/v1/movies/{id}/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    debug!(movie_id = id, "Fetching reviews");
    let reviews = state
        .source()
        .fetch_reviews(id)
        .await
        .map_err(remote_error)?;
    Ok(Json(ReviewsResponse {
        movie_id: id,
        reviews,
    }))
}
