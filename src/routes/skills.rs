use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::new_id;
use crate::domain::skill::{LevelRange, Skill, SkillDifficulty, SkillEdge, SkillRelation};
use crate::response::AppError;
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_skill).get(list_skills))
        .route("/order", get(skill_order))
        .route("/edges", post(create_edge).get(list_edges))
        .route("/:id", get(get_skill).put(update_skill))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkillPayload {
    slug: String,
    label: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    domain: String,
    level_range: LevelRange,
    #[serde(default)]
    prerequisites: Vec<String>,
    estimated_hours: f64,
    difficulty: SkillDifficulty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSkillRequest {
    #[serde(flatten)]
    skill: SkillPayload,
    expected_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSkillsQuery {
    domain: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgePayload {
    src_skill_id: String,
    dst_skill_id: String,
    relation: SkillRelation,
    weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEdgesQuery {
    skill_id: Option<String>,
}

fn skill_from_payload(id: String, payload: SkillPayload, now: DateTime<Utc>) -> Skill {
    Skill {
        id,
        slug: payload.slug,
        label: payload.label,
        description: payload.description,
        tags: payload.tags,
        domain: payload.domain,
        level_range: payload.level_range,
        prerequisites: payload.prerequisites,
        estimated_hours: payload.estimated_hours,
        difficulty: payload.difficulty,
        created_at: now,
        updated_at: now,
    }
}

async fn create_skill(
    State(state): State<AppState>,
    Json(payload): Json<SkillPayload>,
) -> Result<impl IntoResponse, AppError> {
    let skill = skill_from_payload(new_id(), payload, Utc::now());
    let skill = state.store().create_skill(skill)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(skill, "skill created")),
    ))
}

async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<ListSkillsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let skills = state
        .store()
        .skills(query.domain.as_deref(), query.tag.as_deref());
    Ok(Json(SuccessResponse::new(skills)))
}

/// Default execution order over the whole catalog.
async fn skill_order(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let order = state.store().skill_order();
    Ok(Json(SuccessResponse::new(order)))
}

async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let skill = state.store().skill(&id)?;
    Ok(Json(SuccessResponse::new(skill)))
}

async fn update_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateSkillRequest>,
) -> Result<impl IntoResponse, AppError> {
    let skill = skill_from_payload(id, payload.skill, Utc::now());
    let skill = state
        .store()
        .update_skill(skill, payload.expected_updated_at)?;
    Ok(Json(SuccessResponse::with_message(skill, "skill updated")))
}

async fn create_edge(
    State(state): State<AppState>,
    Json(payload): Json<EdgePayload>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let edge = SkillEdge {
        id: new_id(),
        src_skill_id: payload.src_skill_id,
        dst_skill_id: payload.dst_skill_id,
        relation: payload.relation,
        weight: payload.weight.unwrap_or(1.0),
        created_at: now,
        updated_at: now,
    };
    let edge = state.store().create_skill_edge(edge)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(edge, "skill edge created")),
    ))
}

async fn list_edges(
    State(state): State<AppState>,
    Query(query): Query<ListEdgesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let edges = state.store().skill_edges(query.skill_id.as_deref());
    Ok(Json(SuccessResponse::new(edges)))
}
