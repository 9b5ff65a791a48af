use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFrequency {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyPreference {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningGoals {
    pub primary_goal: String,
    #[serde(default)]
    pub secondary_goals: Vec<String>,
    #[serde(default)]
    pub target_roles: Vec<String>,
    pub time_budget_hours: f64,
    pub preferred_learning_style: LearningStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerPreferences {
    pub notification_frequency: NotificationFrequency,
    #[serde(default)]
    pub preferred_content_types: Vec<super::content::ContentType>,
    pub difficulty_preference: DifficultyPreference,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date_earned: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub role: String,
    pub company: String,
    pub duration_months: i32,
    #[serde(default)]
    pub skills_used: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub graduation_year: i32,
    pub field_of_study: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorEvidence {
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
}

/// Learning profile attached 1:1 to a [`super::user::User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub profile: LearnerProfile,
    pub goals: LearningGoals,
    pub preferences: LearnerPreferences,
    pub prior_evidence: PriorEvidence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Learner {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.goals.primary_goal.trim().is_empty() {
            return Err(DomainError::validation("primaryGoal must not be empty"));
        }
        if self.goals.time_budget_hours < 0.0 {
            return Err(DomainError::validation(format!(
                "timeBudgetHours must be >= 0, got {}",
                self.goals.time_budget_hours
            )));
        }
        if self.preferences.language.trim().is_empty() {
            return Err(DomainError::validation("language must not be empty"));
        }
        Ok(())
    }
}
