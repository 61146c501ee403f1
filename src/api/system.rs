use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AppState, HealthResponse};

/// `GET /health`
///
/// Liveness plus the age and size of the cached scrape, if any.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.tenders().status().await,
    })
}
