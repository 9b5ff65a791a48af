use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::learner::{Learner, LearnerPreferences, LearnerProfile, LearningGoals, PriorEvidence};
use crate::domain::new_id;
use crate::domain::user::{User, UserRole};
use crate::response::AppError;
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_learner).get(list_learners))
        .route("/:id", get(get_learner).put(update_learner))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewUserPayload {
    email: String,
    name: String,
    avatar: Option<String>,
    role: Option<UserRole>,
    tenant_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLearnerRequest {
    user: NewUserPayload,
    #[serde(default)]
    profile: LearnerProfile,
    goals: LearningGoals,
    preferences: LearnerPreferences,
    #[serde(default)]
    prior_evidence: PriorEvidence,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLearnerRequest {
    profile: Option<LearnerProfile>,
    goals: Option<LearningGoals>,
    preferences: Option<LearnerPreferences>,
    prior_evidence: Option<PriorEvidence>,
    expected_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListLearnersQuery {
    tenant_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LearnerWithUser {
    user: User,
    learner: Learner,
}

async fn create_learner(
    State(state): State<AppState>,
    Json(payload): Json<CreateLearnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let user = User {
        id: new_id(),
        email: payload.user.email,
        name: payload.user.name,
        avatar: payload.user.avatar,
        role: payload.user.role.unwrap_or(UserRole::Learner),
        tenant_id: payload.user.tenant_id,
        is_active: true,
        is_verified: false,
        created_at: now,
        updated_at: now,
    };
    let learner = Learner {
        id: new_id(),
        user_id: user.id.clone(),
        tenant_id: user.tenant_id.clone(),
        profile: payload.profile,
        goals: payload.goals,
        preferences: payload.preferences,
        prior_evidence: payload.prior_evidence,
        created_at: now,
        updated_at: now,
    };

    let (user, learner) = state.store().create_learner_with_user(user, learner)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(
            LearnerWithUser { user, learner },
            "learner profile created",
        )),
    ))
}

async fn list_learners(
    State(state): State<AppState>,
    Query(query): Query<ListLearnersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let learners = state.store().learners(query.tenant_id.as_deref());
    Ok(Json(SuccessResponse::new(learners)))
}

async fn get_learner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let learner = state.store().learner(&id)?;
    let user = state.store().user(&learner.user_id)?;
    Ok(Json(SuccessResponse::new(LearnerWithUser { user, learner })))
}

async fn update_learner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLearnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut learner = state.store().learner(&id)?;
    if let Some(profile) = payload.profile {
        learner.profile = profile;
    }
    if let Some(goals) = payload.goals {
        learner.goals = goals;
    }
    if let Some(preferences) = payload.preferences {
        learner.preferences = preferences;
    }
    if let Some(prior_evidence) = payload.prior_evidence {
        learner.prior_evidence = prior_evidence;
    }

    let learner = state
        .store()
        .update_learner(learner, payload.expected_updated_at)?;
    Ok(Json(SuccessResponse::with_message(
        learner,
        "learner profile updated",
    )))
}
