use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::citation::Citation;
use crate::domain::coach::{CoachMessage, MessageMetadata, MessageSender, MessageType};
use crate::domain::new_id;
use crate::response::AppError;
use crate::state::AppState;

use super::SuccessResponse;

const DEFAULT_HISTORY_LIMIT: usize = 50;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/messages", post(append_message).get(list_messages))
        .route("/messages/:id/citations", get(list_citations))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewCitationPayload {
    step_id: Option<String>,
    document_id: String,
    quote: String,
    span_start: i64,
    span_end: i64,
    url: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMessageRequest {
    learner_id: String,
    content: String,
    sender: MessageSender,
    #[serde(rename = "type")]
    message_type: Option<MessageType>,
    metadata: Option<MessageMetadata>,
    #[serde(default)]
    citations: Vec<NewCitationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesQuery {
    learner_id: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageWithCitations {
    message: CoachMessage,
    citations: Vec<Citation>,
}

async fn append_message(
    State(state): State<AppState>,
    Json(payload): Json<AppendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let mut message = CoachMessage {
        id: new_id(),
        learner_id: payload.learner_id,
        content: payload.content,
        sender: payload.sender,
        message_type: payload.message_type.unwrap_or(MessageType::Text),
        metadata: payload.metadata.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    let citations: Vec<Citation> = payload
        .citations
        .into_iter()
        .map(|c| Citation {
            id: new_id(),
            step_id: c.step_id,
            message_id: Some(message.id.clone()),
            document_id: c.document_id,
            quote: c.quote,
            span_start: c.span_start,
            span_end: c.span_end,
            url: c.url,
            confidence: c.confidence,
            created_at: now,
            updated_at: now,
        })
        .collect();
    message.metadata.citations = citations.iter().map(|c| c.id.clone()).collect();

    let (message, citations) = state.store().append_message(message, citations)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(
            MessageWithCitations { message, citations },
            "message recorded",
        )),
    ))
}

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.store().messages_for_learner(
        &query.learner_id,
        query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
    )?;
    Ok(Json(SuccessResponse::new(messages)))
}

async fn list_citations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let citations = state.store().citations_for_message(&id)?;
    Ok(Json(SuccessResponse::new(citations)))
}
