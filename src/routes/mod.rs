mod analytics;
mod assessments;
mod calendar;
mod coach;
mod content;
mod health;
mod learners;
mod plans;
mod skills;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::{SERVICE_NAME, SERVICE_VERSION};
use crate::response::json_error;
use crate::state::AppState;

/// Success envelope shared by every `/api/v1` handler.
#[derive(Debug, Serialize)]
pub(crate) struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> SuccessResponse<T> {
    pub(crate) fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub(crate) fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/health", health::router())
        .nest("/api/v1/learners", learners::router())
        .nest("/api/v1/skills", skills::router())
        .nest("/api/v1/content", content::router())
        .nest("/api/v1/plans", plans::router())
        .nest("/api/v1/assessments", assessments::router())
        .nest("/api/v1/coach", coach::router())
        .nest("/api/v1/calendar", calendar::router())
        .nest("/api/v1/analytics", analytics::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Learning Path Generator API",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "health": "/health",
    }))
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route does not exist").into_response()
}
