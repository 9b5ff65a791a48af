use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::domain::content::{
    ContentItem, ContentMetadata, ContentProvider, ContentType, CostModel, LicenseType,
    ProviderKind,
};
use crate::domain::new_id;
use crate::domain::skill::SkillDifficulty;
use crate::response::AppError;
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/providers", post(create_provider).get(list_providers))
        .route("/items", post(create_item))
        .route("/search", get(search_content))
        .route("/:id", get(get_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderPayload {
    name: String,
    kind: ProviderKind,
    api_key_ref: Option<String>,
    license: LicenseType,
    cost_model: CostModel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemPayload {
    provider_id: String,
    uri: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    content_type: ContentType,
    duration_min: i64,
    level: SkillDifficulty,
    language: String,
    cost: f64,
    license: LicenseType,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: ContentMetadata,
    is_featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    q: Option<String>,
    #[serde(rename = "type")]
    content_type: Option<ContentType>,
    tag: Option<String>,
}

async fn create_provider(
    State(state): State<AppState>,
    Json(payload): Json<ProviderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let provider = ContentProvider {
        id: new_id(),
        name: payload.name,
        kind: payload.kind,
        api_key_ref: payload.api_key_ref,
        license: payload.license,
        cost_model: payload.cost_model,
        created_at: now,
        updated_at: now,
    };
    let provider = state.store().create_provider(provider)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(provider, "provider registered")),
    ))
}

async fn list_providers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(SuccessResponse::new(state.store().providers())))
}

async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let item = ContentItem {
        id: new_id(),
        provider_id: payload.provider_id,
        uri: payload.uri,
        title: payload.title,
        description: payload.description,
        content_type: payload.content_type,
        duration_min: payload.duration_min,
        level: payload.level,
        language: payload.language,
        cost: payload.cost,
        license: payload.license,
        tags: payload.tags,
        metadata: payload.metadata,
        is_active: true,
        is_featured: payload.is_featured.unwrap_or(false),
        created_at: now,
        updated_at: now,
    };
    let item = state.store().create_content_item(item)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(item, "content item catalogued")),
    ))
}

async fn search_content(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.store().search_content(
        query.q.as_deref(),
        query.content_type,
        query.tag.as_deref(),
    );
    Ok(Json(SuccessResponse::new(items)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.store().content_item(&id)?;
    Ok(Json(SuccessResponse::new(item)))
}
