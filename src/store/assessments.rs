use chrono::Utc;

use crate::domain::assessment::{
    Assessment, AssessmentAttempt, AttemptDetails, AttemptStatus,
};
use crate::domain::{new_id, DomainError};
use crate::services::scoring::{self, MasteryModel, SubmittedAnswer};

use super::MemoryStore;

impl MemoryStore {
    pub fn create_assessment(&self, assessment: Assessment) -> Result<Assessment, DomainError> {
        assessment.validate()?;

        let mut inner = self.write();
        inner.learner_exists(&assessment.learner_id)?;
        inner.skill_exists(&assessment.skill_id)?;

        inner
            .assessments
            .insert(assessment.id.clone(), assessment.clone());
        Ok(assessment)
    }

    pub fn assessment(&self, id: &str) -> Result<Assessment, DomainError> {
        self.read()
            .assessments
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("assessment", id))
    }

    pub fn assessments_for_learner(
        &self,
        learner_id: &str,
    ) -> Result<Vec<Assessment>, DomainError> {
        let inner = self.read();
        inner.learner_exists(learner_id)?;
        let mut assessments: Vec<Assessment> = inner
            .assessments
            .values()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect();
        assessments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assessments)
    }

    /// Scores and records one submission. The attempt number is assigned
    /// under the write lock so concurrent submissions cannot both claim the
    /// final allowed slot.
    pub fn submit_attempt(
        &self,
        assessment_id: &str,
        answers: &[SubmittedAnswer],
        time_taken_min: i64,
        model: &dyn MasteryModel,
    ) -> Result<(AssessmentAttempt, bool), DomainError> {
        if time_taken_min < 0 {
            return Err(DomainError::validation(format!(
                "timeTakenMin must be >= 0, got {time_taken_min}"
            )));
        }

        let mut inner = self.write();
        let assessment = inner
            .assessments
            .get(assessment_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("assessment", assessment_id))?;

        let attempt_number = inner
            .attempts
            .values()
            .filter(|a| a.assessment_id == assessment_id)
            .count() as i32
            + 1;

        let outcome = scoring::score_attempt(&assessment.spec, answers, attempt_number, model)?;

        let now = Utc::now();
        let attempt = AssessmentAttempt {
            id: new_id(),
            assessment_id: assessment_id.to_string(),
            learner_id: assessment.learner_id.clone(),
            score: outcome.score,
            mastery_prob: outcome.mastery_prob,
            status: AttemptStatus::Completed,
            started_at: now,
            completed_at: Some(now),
            details: AttemptDetails {
                answers: outcome.answers,
                time_taken_min,
                attempt_number,
            },
            created_at: now,
            updated_at: now,
        };
        attempt.validate()?;

        inner.attempts.insert(attempt.id.clone(), attempt.clone());
        Ok((attempt, outcome.passed))
    }

    pub fn attempts_for_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<Vec<AssessmentAttempt>, DomainError> {
        let inner = self.read();
        if !inner.assessments.contains_key(assessment_id) {
            return Err(DomainError::not_found("assessment", assessment_id));
        }
        let mut attempts: Vec<AssessmentAttempt> = inner
            .attempts
            .values()
            .filter(|a| a.assessment_id == assessment_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.details.attempt_number);
        Ok(attempts)
    }
}
