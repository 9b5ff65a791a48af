//! Derivation of step percentages and plan hours from completion facts.

use crate::domain::plan::{LearningPlan, PlanStep, StepStatus};
use crate::domain::DomainError;

use super::dep_graph;

const MINUTES_PER_HOUR: f64 = 60.0;

// Guard against float noise when the derived sum sits exactly on the budget.
const HOURS_EPSILON: f64 = 1e-9;

/// Percentage of a step covered by `completed_content_minutes`, rounded and
/// clamped to [0, 100]. A step with no positive effort cannot carry
/// progress.
pub fn recompute_step_progress(
    step: &PlanStep,
    completed_content_minutes: i64,
) -> Result<i32, DomainError> {
    if step.effort_min <= 0 {
        return Err(DomainError::InvalidEffort {
            effort_min: step.effort_min,
        });
    }
    let ratio = completed_content_minutes as f64 / step.effort_min as f64;
    let percentage = (100.0 * ratio).round();
    Ok(percentage.clamp(0.0, 100.0) as i32)
}

/// Completed hours derived from step progress. A derived value above the
/// plan budget means the stored records are corrupt, which is reported
/// rather than clamped away.
pub fn recompute_plan_hours(
    plan: &LearningPlan,
    steps: &[PlanStep],
) -> Result<f64, DomainError> {
    let completed_minutes: f64 = steps
        .iter()
        .map(|step| step.effort_min as f64 * step.progress_percentage as f64 / 100.0)
        .sum();
    let hours = completed_minutes / MINUTES_PER_HOUR;

    if hours > plan.total_hours + HOURS_EPSILON {
        return Err(DomainError::InconsistentPlan {
            computed: hours,
            total: plan.total_hours,
        });
    }
    Ok(hours)
}

/// Gatekeeper for step status changes.
///
/// pending -> in_progress requires every prerequisite completed;
/// reaching completed requires full progress on an unlocked step;
/// skipped is the administrative end-state for unfinished steps;
/// completed and skipped are terminal.
pub fn check_status_transition(
    step: &PlanStep,
    next: StepStatus,
    siblings: &[PlanStep],
) -> Result<(), DomainError> {
    use StepStatus::*;

    if step.status == next {
        return Err(DomainError::validation(format!(
            "step {} is already {:?}",
            step.id, next
        )));
    }

    match (step.status, next) {
        (Pending, InProgress) => {
            if !dep_graph::is_unlocked(step, siblings) {
                return Err(DomainError::validation(format!(
                    "step {} has incomplete prerequisites",
                    step.id
                )));
            }
            Ok(())
        }
        (Pending | InProgress, Completed) => {
            if !dep_graph::is_unlocked(step, siblings) {
                return Err(DomainError::validation(format!(
                    "step {} has incomplete prerequisites",
                    step.id
                )));
            }
            if step.progress_percentage != 100 {
                return Err(DomainError::validation(format!(
                    "step {} is at {}%, completion requires 100%",
                    step.id, step.progress_percentage
                )));
            }
            Ok(())
        }
        (Pending | InProgress, Skipped) => Ok(()),
        (Completed, _) => Err(DomainError::validation(format!(
            "step {} is completed and cannot change status",
            step.id
        ))),
        (Skipped, _) => Err(DomainError::validation(format!(
            "step {} was skipped and cannot change status",
            step.id
        ))),
        (from, to) => Err(DomainError::validation(format!(
            "step {} cannot move {:?} -> {:?}",
            step.id, from, to
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::plan::{PlanStatus, PlanMetadata, StepKind};

    fn step(effort_min: i64, progress: i32) -> PlanStep {
        let now = Utc::now();
        PlanStep {
            id: "step-1".to_string(),
            plan_id: "plan-1".to_string(),
            skill_id: "skill-1".to_string(),
            content_item_id: None,
            kind: StepKind::Learning,
            title: "Step".to_string(),
            description: None,
            effort_min,
            sequence: 1,
            status: StepStatus::Pending,
            due_at: None,
            completed_at: None,
            progress_percentage: progress,
            prerequisites: Vec::new(),
            unlocks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn plan(total_hours: f64) -> LearningPlan {
        let now = Utc::now();
        LearningPlan {
            id: "plan-1".to_string(),
            learner_id: "learner-1".to_string(),
            title: "Plan".to_string(),
            objective: "Objective".to_string(),
            status: PlanStatus::Active,
            total_hours,
            completed_hours: 0.0,
            start_date: now,
            target_date: now + chrono::Duration::days(30),
            metadata: PlanMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn progress_is_idempotent() {
        let s = step(90, 0);
        let first = recompute_step_progress(&s, 45).unwrap();
        let second = recompute_step_progress(&s, 45).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 50);
    }

    #[test]
    fn progress_is_monotonic() {
        let s = step(90, 0);
        let mut last = 0;
        for minutes in [0, 10, 30, 45, 80, 90, 200] {
            let pct = recompute_step_progress(&s, minutes).unwrap();
            assert!(pct >= last, "{minutes} min regressed to {pct}");
            last = pct;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn zero_effort_is_rejected() {
        let s = step(0, 0);
        assert_eq!(
            recompute_step_progress(&s, 10),
            Err(DomainError::InvalidEffort { effort_min: 0 })
        );
    }

    #[test]
    fn plan_hours_sum_step_fractions() {
        let p = plan(10.0);
        let mut a = step(120, 0);
        a.progress_percentage = 50;
        let mut b = step(60, 0);
        b.id = "step-2".to_string();
        b.progress_percentage = 100;
        // 120 * 0.5 + 60 * 1.0 = 120 minutes = 2 hours
        let hours = recompute_plan_hours(&p, &[a, b]).unwrap();
        assert!((hours - 2.0).abs() < 1e-9);
    }

    #[test]
    fn overflowing_budget_is_corruption_not_clamping() {
        let p = plan(1.0);
        let mut a = step(120, 0);
        a.progress_percentage = 100;
        let err = recompute_plan_hours(&p, &[a]).unwrap_err();
        assert!(matches!(err, DomainError::InconsistentPlan { .. }));
    }

    #[test]
    fn completion_requires_full_progress() {
        let mut s = step(60, 60);
        s.status = StepStatus::InProgress;
        let siblings = vec![s.clone()];
        assert!(check_status_transition(&s, StepStatus::Completed, &siblings).is_err());

        s.progress_percentage = 100;
        let siblings = vec![s.clone()];
        assert!(check_status_transition(&s, StepStatus::Completed, &siblings).is_ok());
    }

    #[test]
    fn completed_is_terminal() {
        let mut s = step(60, 100);
        s.status = StepStatus::Completed;
        let siblings = vec![s.clone()];
        assert!(check_status_transition(&s, StepStatus::Pending, &siblings).is_err());
        assert!(check_status_transition(&s, StepStatus::Skipped, &siblings).is_err());
    }
}
