use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{handlers, movies, sync};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Categories
        .route("/categories/{category}", get(movies::list_category))
        // Movies
        .route("/movies/{id}", get(movies::get_movie))
        .route(
            "/movies/{id}/favorite",
            get(movies::get_favorite)
                .post(movies::toggle_favorite)
                .put(movies::set_favorite),
        )
        .route("/movies/{id}/videos", get(movies::list_videos))
        .route("/movies/{id}/reviews", get(movies::list_reviews))
        // Sync
        .route("/sync", post(sync::trigger_sync))
        .route("/sync/status", get(sync::get_status))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
