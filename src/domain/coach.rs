use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Suggestion,
    PlanUpdate,
    AssessmentResult,
}

/// A structural change the coach proposed or reported against a plan.
/// Tagged variants instead of the open-ended `planChanges?: any[]` blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanChange {
    StepAdded { step_id: String },
    StepRemoved { step_id: String },
    StepRescheduled { step_id: String, due_at: DateTime<Utc> },
    TargetDateMoved { target_date: DateTime<Utc> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub plan_changes: Vec<PlanChange>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub related_content: Vec<String>,
}

/// One entry in a learner's coach conversation log. Listing is ordered by
/// `created_at`; response generation happens outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachMessage {
    pub id: String,
    pub learner_id: String,
    pub content: String,
    pub sender: MessageSender,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CoachMessage {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.content.trim().is_empty() {
            return Err(DomainError::validation("message content must not be empty"));
        }
        Ok(())
    }
}
