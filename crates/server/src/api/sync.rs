//! Sync API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use marquee_core::{CatalogStats, SchedulerStatus, SyncError, SyncResult};

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    pub catalog: CatalogStats,
    pub sync_in_progress: bool,
    /// Absent when background sync is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerStatus>,
}

fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::InProgress => StatusCode::CONFLICT,
        SyncError::Network { .. } | SyncError::Decode { .. } => StatusCode::BAD_GATEWAY,
        SyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        SyncError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

/// POST /api/v1/sync
///
/// Run a sync now and wait for it to finish.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncResult>, ApiError> {
    state.sync().sync().await.map(Json).map_err(sync_error)
}

/// GET /api/v1/sync/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let catalog = state
        .catalog()
        .stats()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    let scheduler = match state.scheduler() {
        Some(scheduler) => Some(scheduler.status().await),
        None => None,
    };

    Ok(Json(SyncStatusResponse {
        catalog,
        sync_in_progress: state.sync().is_syncing(),
        scheduler,
    }))
}
