use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::calendar::{CalendarEvent, CalendarProvider, EventStatus};
use crate::domain::new_id;
use crate::response::AppError;
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/:id", get(get_event).put(update_event))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest {
    learner_id: String,
    plan_step_id: Option<String>,
    provider: Option<CalendarProvider>,
    external_id: Option<String>,
    title: String,
    description: Option<String>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    location: Option<String>,
    #[serde(default)]
    attendees: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsQuery {
    learner_id: String,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEventRequest {
    title: Option<String>,
    description: Option<String>,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    status: Option<EventStatus>,
    location: Option<String>,
    attendees: Option<Vec<String>>,
    expected_updated_at: Option<DateTime<Utc>>,
}

async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let event = CalendarEvent {
        id: new_id(),
        learner_id: payload.learner_id,
        plan_step_id: payload.plan_step_id,
        provider: payload.provider.unwrap_or(CalendarProvider::Internal),
        external_id: payload.external_id,
        title: payload.title,
        description: payload.description,
        start_at: payload.start_at,
        end_at: payload.end_at,
        status: EventStatus::Scheduled,
        location: payload.location,
        attendees: payload.attendees,
        created_at: now,
        updated_at: now,
    };
    let event = state.store().create_event(event)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(event, "event scheduled")),
    ))
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .store()
        .events_for_learner(&query.learner_id, query.from, query.to)?;
    Ok(Json(SuccessResponse::new(events)))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.store().event(&id)?;
    Ok(Json(SuccessResponse::new(event)))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut event = state.store().event(&id)?;
    if let Some(title) = payload.title {
        event.title = title;
    }
    if let Some(description) = payload.description {
        event.description = Some(description);
    }
    if let Some(start_at) = payload.start_at {
        event.start_at = start_at;
    }
    if let Some(end_at) = payload.end_at {
        event.end_at = end_at;
    }
    if let Some(status) = payload.status {
        event.status = status;
    }
    if let Some(location) = payload.location {
        event.location = Some(location);
    }
    if let Some(attendees) = payload.attendees {
        event.attendees = attendees;
    }

    let event = state.store().update_event(event, payload.expected_updated_at)?;
    Ok(Json(SuccessResponse::with_message(event, "event updated")))
}
