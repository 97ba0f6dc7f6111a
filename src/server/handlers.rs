use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use super::error::ApiResult;
use super::AppState;
use crate::sync::{ApiResponse, ChangeSet, ChangesQuery, FullSyncResult, PushResult, SyncRequest};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/sync/changes`
pub async fn get_changes(
    State(state): State<AppState>,
    query: Result<Query<ChangesQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<ChangeSet>>> {
    let Query(query) = query?;

    let changes = state
        .sync
        .pull(query.last_sync_time, query.station_id.as_deref())
        .await?;

    let message = format!("Found {} changes", changes.total_changes);
    Ok(Json(ApiResponse::ok(changes).with_message(message)))
}

/// `POST /api/sync/push`
pub async fn push_changes(
    State(state): State<AppState>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<PushResult>>> {
    let Json(request) = body?;

    let result = state.sync.push(&request).await?;

    let message = format!("Synced {} items", result.synced_count);
    Ok(Json(ApiResponse::ok(result).with_message(message)))
}

/// `POST /api/sync/full`
pub async fn full_sync(
    State(state): State<AppState>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<FullSyncResult>>> {
    let Json(request) = body?;

    let result = state.sync.full_sync(&request).await?;

    Ok(Json(ApiResponse::ok(result)))
}
