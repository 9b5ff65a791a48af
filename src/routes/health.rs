use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use chrono::{DateTime, Utc};

use crate::config::{SERVICE_NAME, SERVICE_VERSION};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(health_root))
        .route("/ready", get(ready))
        .route("/live", get(live))
        .route("/info", get(info))
}

async fn health_root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "timestamp": Utc::now(),
    }))
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    // The store is process-local; readiness is a lock round-trip.
    let learners = state.store().learners(None).len();
    Json(serde_json::json!({
        "status": "ready",
        "learners": learners,
    }))
}

async fn live() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

async fn info(State(state): State<AppState>) -> impl IntoResponse {
    let started_at: DateTime<Utc> = state.started_at_system().into();
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "uptimeSeconds": state.uptime_seconds(),
        "startedAt": started_at,
    }))
}
