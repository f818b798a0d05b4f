use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use banquet_core::store::RequestStore;

#[derive(Clone)]
pub struct HealthState {
    store: Arc<RequestStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pending_requests: usize,
    pub checked_at: String,
}

pub fn router(store: Arc<RequestStore>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ok",
        pending_requests: state.store.pending_count(),
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}
