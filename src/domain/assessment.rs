use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Diagnostic,
    Formative,
    Summative,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// A submitted or expected answer. Single-choice questions carry one string,
/// multi-answer questions a set of strings compared order-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    pub fn matches(&self, other: &AnswerValue) -> bool {
        match (self, other) {
            (AnswerValue::Single(a), AnswerValue::Single(b)) => a == b,
            (AnswerValue::Multiple(a), AnswerValue::Multiple(b)) => {
                let a: HashSet<&str> = a.iter().map(String::as_str).collect();
                let b: HashSet<&str> = b.iter().map(String::as_str).collect();
                a == b
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: AnswerValue,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSpec {
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_min: Option<i64>,
    pub passing_score: f64,
    pub max_attempts: i32,
}

impl AssessmentSpec {
    pub fn total_points(&self) -> i32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.questions.is_empty() {
            return Err(DomainError::validation(
                "assessment must define at least one question",
            ));
        }
        let mut seen = HashSet::new();
        for question in &self.questions {
            if question.points <= 0 {
                return Err(DomainError::validation(format!(
                    "question {} must be worth > 0 points, got {}",
                    question.id, question.points
                )));
            }
            if !seen.insert(question.id.as_str()) {
                return Err(DomainError::validation(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.passing_score) {
            return Err(DomainError::validation(format!(
                "passingScore {} outside [0, 100]",
                self.passing_score
            )));
        }
        if self.max_attempts < 1 {
            return Err(DomainError::validation(format!(
                "maxAttempts must be >= 1, got {}",
                self.max_attempts
            )));
        }
        Ok(())
    }
}

/// Scored evaluation definition targeting one skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub learner_id: String,
    pub skill_id: String,
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub spec: AssessmentSpec,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation(
                "assessment title must not be empty",
            ));
        }
        self.spec.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub answer: AnswerValue,
    pub is_correct: bool,
    pub points_earned: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDetails {
    pub answers: Vec<AnswerRecord>,
    pub time_taken_min: i64,
    pub attempt_number: i32,
}

/// One scored submission against an [`Assessment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAttempt {
    pub id: String,
    pub assessment_id: String,
    pub learner_id: String,
    pub score: f64,
    pub mastery_prob: f64,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub details: AttemptDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssessmentAttempt {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=100.0).contains(&self.score) {
            return Err(DomainError::validation(format!(
                "score {} outside [0, 100]",
                self.score
            )));
        }
        if !(0.0..=1.0).contains(&self.mastery_prob) {
            return Err(DomainError::validation(format!(
                "masteryProb {} outside [0, 1]",
                self.mastery_prob
            )));
        }
        if self.details.attempt_number < 1 {
            return Err(DomainError::validation(format!(
                "attemptNumber must be >= 1, got {}",
                self.details.attempt_number
            )));
        }
        Ok(())
    }
}
