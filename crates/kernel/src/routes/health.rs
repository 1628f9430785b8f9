//! Health check routes.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Liveness and database health.
///
/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if db::check_health(state.db()).await {
        "up"
    } else {
        "down"
    };

    Json(HealthResponse {
        status: "ok",
        database,
    })
}
