use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::response::AppError;
use crate::services::analytics::{learner_analytics, AnalyticsSources};
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/progress", get(progress_analytics))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressQuery {
    learner_id: String,
}

async fn progress_analytics(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.store().learner_snapshot(&query.learner_id)?;
    let analytics = learner_analytics(
        &AnalyticsSources {
            plans: &snapshot.plans,
            steps: &snapshot.steps,
            assessments: &snapshot.assessments,
            attempts: &snapshot.attempts,
            skills: &snapshot.skills,
            content: &snapshot.content,
            events: &snapshot.events,
        },
        Utc::now(),
    );
    Ok(Json(SuccessResponse::new(analytics)))
}
