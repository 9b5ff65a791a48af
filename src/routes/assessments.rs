use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::assessment::{Assessment, AssessmentAttempt, AssessmentSpec, AssessmentType};
use crate::domain::new_id;
use crate::response::AppError;
use crate::services::scoring::{CalibratedMasteryModel, SubmittedAnswer};
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_assessment).get(list_assessments))
        .route("/:id", get(get_assessment))
        .route("/:id/attempts", post(submit_attempt).get(list_attempts))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssessmentRequest {
    learner_id: String,
    skill_id: String,
    #[serde(rename = "type")]
    assessment_type: AssessmentType,
    title: String,
    description: Option<String>,
    spec: AssessmentSpec,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAssessmentsQuery {
    learner_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAttemptRequest {
    answers: Vec<SubmittedAnswer>,
    time_taken_min: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttemptResponse {
    attempt: AssessmentAttempt,
    passed: bool,
}

async fn create_assessment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let assessment = Assessment {
        id: new_id(),
        learner_id: payload.learner_id,
        skill_id: payload.skill_id,
        assessment_type: payload.assessment_type,
        title: payload.title,
        description: payload.description,
        spec: payload.spec,
        created_at: now,
        updated_at: now,
    };
    let assessment = state.store().create_assessment(assessment)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(assessment, "assessment created")),
    ))
}

async fn list_assessments(
    State(state): State<AppState>,
    Query(query): Query<ListAssessmentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let assessments = state.store().assessments_for_learner(&query.learner_id)?;
    Ok(Json(SuccessResponse::new(assessments)))
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state.store().assessment(&id)?;
    Ok(Json(SuccessResponse::new(assessment)))
}

async fn submit_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (attempt, passed) = state.store().submit_attempt(
        &id,
        &payload.answers,
        payload.time_taken_min.unwrap_or(0),
        &CalibratedMasteryModel,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(
            AttemptResponse { attempt, passed },
            "attempt scored",
        )),
    ))
}

async fn list_attempts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = state.store().attempts_for_assessment(&id)?;
    Ok(Json(SuccessResponse::new(attempts)))
}
