use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::new_id;
use crate::domain::plan::{
    LearningPlan, PlanMetadata, PlanStatus, PlanStep, StepKind, StepStatus,
};
use crate::domain::DomainError;
use crate::response::AppError;
use crate::services::dep_graph;
use crate::state::AppState;

use super::SuccessResponse;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_plan).get(list_plans))
        .route("/:id", get(get_plan).put(update_plan))
        .route("/:id/summary", get(plan_summary))
        .route("/:id/steps/:step_id/progress", put(update_step_progress))
        .route("/:id/steps/:step_id/status", put(update_step_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewStepPayload {
    skill_id: String,
    content_item_id: Option<String>,
    kind: Option<StepKind>,
    title: String,
    description: Option<String>,
    effort_min: i64,
    sequence: i32,
    due_at: Option<DateTime<Utc>>,
    /// Sequence numbers of sibling steps that must complete first. Step ids
    /// do not exist yet at creation time, so prerequisites are addressed by
    /// sequence and resolved to ids here.
    #[serde(default)]
    prerequisites: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlanRequest {
    learner_id: String,
    title: String,
    objective: String,
    status: Option<PlanStatus>,
    total_hours: f64,
    start_date: DateTime<Utc>,
    target_date: DateTime<Utc>,
    metadata: Option<PlanMetadata>,
    steps: Vec<NewStepPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPlansQuery {
    learner_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlanRequest {
    title: Option<String>,
    objective: Option<String>,
    status: Option<PlanStatus>,
    total_hours: Option<f64>,
    target_date: Option<DateTime<Utc>>,
    metadata: Option<PlanMetadata>,
    expected_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepProgressRequest {
    completed_content_minutes: i64,
    expected_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepStatusRequest {
    status: StepStatus,
    expected_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanWithSteps {
    plan: LearningPlan,
    steps: Vec<PlanStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepAndPlan {
    step: PlanStep,
    plan: LearningPlan,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextStep {
    step_id: String,
    title: String,
    sequence: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanSummaryResponse {
    plan_id: String,
    status: PlanStatus,
    total_hours: f64,
    completed_hours: f64,
    percent_complete: f64,
    steps_total: usize,
    steps_completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_step: Option<NextStep>,
}

fn build_steps(
    plan_id: &str,
    payloads: Vec<NewStepPayload>,
    now: DateTime<Utc>,
) -> Result<Vec<PlanStep>, DomainError> {
    let mut id_by_sequence: HashMap<i32, String> = HashMap::new();
    for payload in &payloads {
        if id_by_sequence.insert(payload.sequence, new_id()).is_some() {
            return Err(DomainError::validation(format!(
                "duplicate step sequence {}",
                payload.sequence
            )));
        }
    }

    let mut steps = Vec::with_capacity(payloads.len());
    for payload in &payloads {
        let mut prerequisites = Vec::with_capacity(payload.prerequisites.len());
        for prereq_sequence in &payload.prerequisites {
            if *prereq_sequence == payload.sequence {
                return Err(DomainError::validation(format!(
                    "step {} cannot require itself",
                    payload.sequence
                )));
            }
            let Some(id) = id_by_sequence.get(prereq_sequence) else {
                return Err(DomainError::validation(format!(
                    "step {} requires unknown sequence {}",
                    payload.sequence, prereq_sequence
                )));
            };
            prerequisites.push(id.clone());
        }

        steps.push(PlanStep {
            id: id_by_sequence[&payload.sequence].clone(),
            plan_id: plan_id.to_string(),
            skill_id: payload.skill_id.clone(),
            content_item_id: payload.content_item_id.clone(),
            kind: payload.kind.unwrap_or(StepKind::Learning),
            title: payload.title.clone(),
            description: payload.description.clone(),
            effort_min: payload.effort_min,
            sequence: payload.sequence,
            status: StepStatus::Pending,
            due_at: payload.due_at,
            completed_at: None,
            progress_percentage: 0,
            prerequisites,
            unlocks: Vec::new(),
            created_at: now,
            updated_at: now,
        });
    }

    // Derive the unlock side so the mirror invariant holds by construction.
    let reverse: Vec<(String, String)> = steps
        .iter()
        .flat_map(|step| {
            step.prerequisites
                .iter()
                .map(|prereq| (prereq.clone(), step.id.clone()))
                .collect::<Vec<_>>()
        })
        .collect();
    for (upstream, downstream) in reverse {
        if let Some(step) = steps.iter_mut().find(|s| s.id == upstream) {
            step.unlocks.push(downstream);
        }
    }

    Ok(steps)
}

async fn create_plan(
    State(state): State<AppState>,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let plan = LearningPlan {
        id: new_id(),
        learner_id: payload.learner_id,
        title: payload.title,
        objective: payload.objective,
        status: payload.status.unwrap_or(PlanStatus::Draft),
        total_hours: payload.total_hours,
        completed_hours: 0.0,
        start_date: payload.start_date,
        target_date: payload.target_date,
        metadata: payload.metadata.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };
    let steps = build_steps(&plan.id, payload.steps, now)?;

    let (plan, steps) = state.store().create_plan(plan, steps)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(
            PlanWithSteps { plan, steps },
            "learning plan created",
        )),
    ))
}

async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> Result<impl IntoResponse, AppError> {
    let plans = state.store().plans_for_learner(&query.learner_id)?;
    Ok(Json(SuccessResponse::new(plans)))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state.store().plan(&id)?;
    let steps = state.store().plan_steps(&id)?;
    Ok(Json(SuccessResponse::new(PlanWithSteps { plan, steps })))
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut plan = state.store().plan(&id)?;
    if let Some(title) = payload.title {
        plan.title = title;
    }
    if let Some(objective) = payload.objective {
        plan.objective = objective;
    }
    if let Some(status) = payload.status {
        plan.status = status;
    }
    if let Some(total_hours) = payload.total_hours {
        plan.total_hours = total_hours;
    }
    if let Some(target_date) = payload.target_date {
        plan.target_date = target_date;
    }
    if let Some(metadata) = payload.metadata {
        plan.metadata = metadata;
    }

    let plan = state.store().update_plan(plan, payload.expected_updated_at)?;
    Ok(Json(SuccessResponse::with_message(plan, "plan updated")))
}

/// Percent complete plus the next step a learner can start: the first
/// pending step in topological order whose prerequisites are all done.
async fn plan_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state.store().plan(&id)?;
    let steps = state.store().plan_steps(&id)?;

    let percent_complete = if plan.total_hours > 0.0 {
        (plan.completed_hours / plan.total_hours * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let steps_completed = steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .count();

    let next_step = dep_graph::topological_order(&dep_graph::step_nodes(&steps))
        .filter_map(|step_id| steps.iter().find(|s| s.id == step_id))
        .find(|step| step.status == StepStatus::Pending && dep_graph::is_unlocked(step, &steps))
        .map(|step| NextStep {
            step_id: step.id.clone(),
            title: step.title.clone(),
            sequence: step.sequence,
        });

    Ok(Json(SuccessResponse::new(PlanSummaryResponse {
        plan_id: plan.id.clone(),
        status: plan.status,
        total_hours: plan.total_hours,
        completed_hours: plan.completed_hours,
        percent_complete,
        steps_total: steps.len(),
        steps_completed,
        next_step,
    })))
}

async fn update_step_progress(
    State(state): State<AppState>,
    Path((plan_id, step_id)): Path<(String, String)>,
    Json(payload): Json<StepProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (step, plan) = state.store().update_step_progress(
        &plan_id,
        &step_id,
        payload.completed_content_minutes,
        payload.expected_updated_at,
    )?;
    Ok(Json(SuccessResponse::with_message(
        StepAndPlan { step, plan },
        "step progress recorded",
    )))
}

async fn update_step_status(
    State(state): State<AppState>,
    Path((plan_id, step_id)): Path<(String, String)>,
    Json(payload): Json<StepStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (step, plan) = state.store().transition_step(
        &plan_id,
        &step_id,
        payload.status,
        payload.expected_updated_at,
    )?;
    Ok(Json(SuccessResponse::with_message(
        StepAndPlan { step, plan },
        "step status updated",
    )))
}
