use chrono::{DateTime, Utc};

use crate::domain::plan::{self, LearningPlan, PlanStatus, PlanStep, StepStatus};
use crate::domain::DomainError;
use crate::services::{dep_graph, progress};

use super::{ensure_unmodified, MemoryStore, StoreInner};

fn plan_steps_of(inner: &StoreInner, plan_id: &str) -> Vec<PlanStep> {
    let mut steps: Vec<PlanStep> = inner
        .steps
        .values()
        .filter(|s| s.plan_id == plan_id)
        .cloned()
        .collect();
    steps.sort_by_key(|s| s.sequence);
    steps
}

impl MemoryStore {
    /// Writes a plan and its steps as one unit. Either the whole graph is
    /// valid (references resolve, sequences are unique, prerequisite edges
    /// mirror and form a DAG) or nothing lands.
    pub fn create_plan(
        &self,
        plan: LearningPlan,
        steps: Vec<PlanStep>,
    ) -> Result<(LearningPlan, Vec<PlanStep>), DomainError> {
        plan.validate()?;

        let mut inner = self.write();
        inner.learner_exists(&plan.learner_id)?;
        for step in &steps {
            if step.plan_id != plan.id {
                return Err(DomainError::validation(format!(
                    "step {} does not belong to plan {}",
                    step.id, plan.id
                )));
            }
            inner.skill_exists(&step.skill_id)?;
            if let Some(content_id) = &step.content_item_id {
                if !inner.content_items.contains_key(content_id) {
                    return Err(DomainError::not_found("content item", content_id));
                }
            }
        }
        plan::validate_step_set(&steps)?;
        dep_graph::validate(&dep_graph::step_nodes(&steps))?;
        progress::recompute_plan_hours(&plan, &steps)?;

        inner.plans.insert(plan.id.clone(), plan.clone());
        for step in &steps {
            inner.steps.insert(step.id.clone(), step.clone());
        }
        Ok((plan, steps))
    }

    pub fn plan(&self, id: &str) -> Result<LearningPlan, DomainError> {
        self.read()
            .plans
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("plan", id))
    }

    pub fn plans_for_learner(&self, learner_id: &str) -> Result<Vec<LearningPlan>, DomainError> {
        let inner = self.read();
        inner.learner_exists(learner_id)?;
        let mut plans: Vec<LearningPlan> = inner
            .plans
            .values()
            .filter(|p| p.learner_id == learner_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    /// Steps of one plan in sequence order.
    pub fn plan_steps(&self, plan_id: &str) -> Result<Vec<PlanStep>, DomainError> {
        let inner = self.read();
        if !inner.plans.contains_key(plan_id) {
            return Err(DomainError::not_found("plan", plan_id));
        }
        Ok(plan_steps_of(&inner, plan_id))
    }

    /// Updates plan header fields. Archived plans are frozen; derived
    /// fields (`completed_hours`) and ownership cannot be rewritten here.
    pub fn update_plan(
        &self,
        mut plan: LearningPlan,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<LearningPlan, DomainError> {
        plan.validate()?;

        let mut inner = self.write();
        let stored = inner
            .plans
            .get(&plan.id)
            .ok_or_else(|| DomainError::not_found("plan", &plan.id))?;
        ensure_unmodified("plan", &plan.id, stored.updated_at, expected_updated_at)?;
        if stored.status == PlanStatus::Archived {
            return Err(DomainError::validation(format!(
                "plan {} is archived and cannot change",
                plan.id
            )));
        }
        if stored.learner_id != plan.learner_id {
            return Err(DomainError::validation("plan ownership is immutable"));
        }
        if (stored.completed_hours - plan.completed_hours).abs() > f64::EPSILON {
            return Err(DomainError::validation(
                "completedHours is derived from step progress and cannot be set",
            ));
        }

        plan.created_at = stored.created_at;
        plan.updated_at = Utc::now();
        inner.plans.insert(plan.id.clone(), plan.clone());
        Ok(plan)
    }

    /// Applies reported content minutes to one step, then re-derives the
    /// plan's completed hours. Both records change together or not at all.
    pub fn update_step_progress(
        &self,
        plan_id: &str,
        step_id: &str,
        completed_content_minutes: i64,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(PlanStep, LearningPlan), DomainError> {
        let mut inner = self.write();
        let mut plan = inner
            .plans
            .get(plan_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("plan", plan_id))?;
        let mut step = inner
            .steps
            .get(step_id)
            .filter(|s| s.plan_id == plan_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("plan step", step_id))?;
        ensure_unmodified("plan step", step_id, step.updated_at, expected_updated_at)?;

        if matches!(step.status, StepStatus::Completed | StepStatus::Skipped) {
            return Err(DomainError::validation(format!(
                "step {} is {:?} and no longer accepts progress",
                step.id, step.status
            )));
        }

        step.progress_percentage = progress::recompute_step_progress(&step, completed_content_minutes)?;
        step.updated_at = Utc::now();
        step.validate()?;

        let mut steps = plan_steps_of(&inner, plan_id);
        if let Some(slot) = steps.iter_mut().find(|s| s.id == step.id) {
            *slot = step.clone();
        }
        plan.completed_hours = progress::recompute_plan_hours(&plan, &steps)?;
        plan.updated_at = step.updated_at;
        plan.validate()?;

        inner.steps.insert(step.id.clone(), step.clone());
        inner.plans.insert(plan.id.clone(), plan.clone());
        Ok((step, plan))
    }

    /// Moves a step through its lifecycle, enforcing unlock and progress
    /// gates, and re-derives plan hours on completion.
    pub fn transition_step(
        &self,
        plan_id: &str,
        step_id: &str,
        next: StepStatus,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(PlanStep, LearningPlan), DomainError> {
        let mut inner = self.write();
        let mut plan = inner
            .plans
            .get(plan_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("plan", plan_id))?;
        let mut step = inner
            .steps
            .get(step_id)
            .filter(|s| s.plan_id == plan_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("plan step", step_id))?;
        ensure_unmodified("plan step", step_id, step.updated_at, expected_updated_at)?;

        let siblings = plan_steps_of(&inner, plan_id);
        progress::check_status_transition(&step, next, &siblings)?;

        let now = Utc::now();
        step.status = next;
        step.updated_at = now;
        if next == StepStatus::Completed {
            step.completed_at = Some(now);
        }
        step.validate()?;

        let mut steps = siblings;
        if let Some(slot) = steps.iter_mut().find(|s| s.id == step.id) {
            *slot = step.clone();
        }
        plan.completed_hours = progress::recompute_plan_hours(&plan, &steps)?;
        plan.updated_at = now;
        plan.validate()?;

        inner.steps.insert(step.id.clone(), step.clone());
        inner.plans.insert(plan.id.clone(), plan.clone());
        Ok((step, plan))
    }
}
