//! HTTP surface of the sync server.
//!
//! # Endpoints
//!
//! - `GET /health`: liveness and version
//! - `GET /api/sync/changes?lastSyncTime=&stationId=`: pull
//! - `POST /api/sync/push`: push
//! - `POST /api/sync/full`: push then pull

mod error;
mod handlers;

pub use error::{ApiError, ApiResult};

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::sync::SyncService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sync: SyncService,
}

impl AppState {
    pub fn new(sync: SyncService) -> Self {
        Self { sync }
    }
}

/// Builds the router with every route and request tracing.
pub fn router(state: AppState) -> Router {
    let sync_routes = Router::new()
        .route("/changes", get(handlers::get_changes))
        .route("/push", post(handlers::push_changes))
        .route("/full", post(handlers::full_sync));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/sync", sync_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
