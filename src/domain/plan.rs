use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Learning,
    Assessment,
    Project,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    Ai,
    Human,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetadata {
    pub created_by: PlanOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub adaptation_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_adapted: Option<DateTime<Utc>>,
}

impl Default for PlanMetadata {
    fn default() -> Self {
        Self {
            created_by: PlanOrigin::Human,
            template_id: None,
            adaptation_count: 0,
            last_adapted: None,
        }
    }
}

/// A learner's ordered curriculum. `completed_hours` is derived from step
/// progress and must never exceed `total_hours`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlan {
    pub id: String,
    pub learner_id: String,
    pub title: String,
    pub objective: String,
    pub status: PlanStatus,
    pub total_hours: f64,
    pub completed_hours: f64,
    pub start_date: DateTime<Utc>,
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub metadata: PlanMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearningPlan {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("plan title must not be empty"));
        }
        if self.total_hours < 0.0 {
            return Err(DomainError::validation(format!(
                "totalHours must be >= 0, got {}",
                self.total_hours
            )));
        }
        if self.completed_hours < 0.0 || self.completed_hours > self.total_hours {
            return Err(DomainError::validation(format!(
                "completedHours {} outside [0, {}]",
                self.completed_hours, self.total_hours
            )));
        }
        if self.start_date > self.target_date {
            return Err(DomainError::validation(
                "startDate must not be after targetDate",
            ));
        }
        Ok(())
    }
}

/// A unit of work inside a plan, tied to one skill and optionally one
/// content item. Prerequisite/unlock edges point at sibling steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub id: String,
    pub plan_id: String,
    pub skill_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_item_id: Option<String>,
    pub kind: StepKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub effort_min: i64,
    pub sequence: i32,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub progress_percentage: i32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub unlocks: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanStep {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("step title must not be empty"));
        }
        if !(0..=100).contains(&self.progress_percentage) {
            return Err(DomainError::validation(format!(
                "progressPercentage {} outside [0, 100]",
                self.progress_percentage
            )));
        }
        if self.status == StepStatus::Completed && self.progress_percentage != 100 {
            return Err(DomainError::validation(format!(
                "completed step {} must have progress 100, got {}",
                self.id, self.progress_percentage
            )));
        }
        if self.prerequisites.iter().any(|p| p == &self.id) {
            return Err(DomainError::validation(format!(
                "step {} cannot be its own prerequisite",
                self.id
            )));
        }
        Ok(())
    }
}

/// Structural checks across the steps of one plan: unique sequence numbers,
/// sibling-only references, and `unlocks` mirroring `prerequisites`.
/// Acyclicity is checked separately by the dependency graph.
pub fn validate_step_set(steps: &[PlanStep]) -> Result<(), DomainError> {
    let ids: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();

    let mut sequences = HashSet::new();
    for step in steps {
        step.validate()?;
        if !sequences.insert(step.sequence) {
            return Err(DomainError::validation(format!(
                "duplicate step sequence {}",
                step.sequence
            )));
        }
        for prereq in &step.prerequisites {
            if !ids.contains(prereq.as_str()) {
                return Err(DomainError::validation(format!(
                    "step {} references unknown prerequisite {}",
                    step.id, prereq
                )));
            }
        }
        for unlocked in &step.unlocks {
            if !ids.contains(unlocked.as_str()) {
                return Err(DomainError::validation(format!(
                    "step {} references unknown unlock {}",
                    step.id, unlocked
                )));
            }
        }
    }

    for step in steps {
        for prereq in &step.prerequisites {
            let upstream = steps.iter().find(|s| &s.id == prereq).unwrap();
            if !upstream.unlocks.contains(&step.id) {
                return Err(DomainError::validation(format!(
                    "step {} lists prerequisite {} but is missing from its unlocks",
                    step.id, prereq
                )));
            }
        }
        for unlocked in &step.unlocks {
            let downstream = steps.iter().find(|s| &s.id == unlocked).unwrap();
            if !downstream.prerequisites.contains(&step.id) {
                return Err(DomainError::validation(format!(
                    "step {} unlocks {} but is missing from its prerequisites",
                    step.id, unlocked
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn step(id: &str, sequence: i32) -> PlanStep {
        let now = Utc::now();
        PlanStep {
            id: id.to_string(),
            plan_id: "plan-1".to_string(),
            skill_id: "skill-1".to_string(),
            content_item_id: None,
            kind: StepKind::Learning,
            title: format!("Step {id}"),
            description: None,
            effort_min: 60,
            sequence,
            status: StepStatus::Pending,
            due_at: None,
            completed_at: None,
            progress_percentage: 0,
            prerequisites: Vec::new(),
            unlocks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn duplicate_sequence_rejected() {
        let steps = vec![step("a", 1), step("b", 1)];
        assert!(validate_step_set(&steps).is_err());
    }

    #[test]
    fn unlocks_must_mirror_prerequisites() {
        let mut a = step("a", 1);
        let mut b = step("b", 2);
        b.prerequisites = vec!["a".to_string()];
        assert!(validate_step_set(&[a.clone(), b.clone()]).is_err());

        a.unlocks = vec!["b".to_string()];
        assert!(validate_step_set(&[a, b]).is_ok());
    }

    #[test]
    fn completed_step_needs_full_progress() {
        let mut s = step("a", 1);
        s.status = StepStatus::Completed;
        s.progress_percentage = 80;
        assert!(s.validate().is_err());
    }
}
