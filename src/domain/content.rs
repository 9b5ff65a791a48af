use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::skill::SkillDifficulty;
use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Lms,
    VideoPlatform,
    Documentation,
    CoursePlatform,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    Free,
    Subscription,
    PerSeat,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    Reading,
    Interactive,
    Assessment,
    Project,
}

/// Billing shape for a provider. Structured variants instead of the loose
/// `{type, amount?, currency?}` map the catalog sync job emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CostModel {
    Free,
    PerCourse { amount: f64, currency: String },
    PerUser { amount: f64, currency: String },
    Subscription { amount: f64, currency: String },
}

impl CostModel {
    fn validate(&self) -> Result<(), DomainError> {
        let amount = match self {
            CostModel::Free => return Ok(()),
            CostModel::PerCourse { amount, .. }
            | CostModel::PerUser { amount, .. }
            | CostModel::Subscription { amount, .. } => *amount,
        };
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::validation(format!(
                "cost model amount must be >= 0, got {amount}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentProvider {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_ref: Option<String>,
    pub license: LicenseType,
    pub cost_model: CostModel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentProvider {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("provider name must not be empty"));
        }
        self.cost_model.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
}

/// One external learning resource catalogued with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub provider_id: String,
    pub uri: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub duration_min: i64,
    pub level: SkillDifficulty,
    pub language: String,
    pub cost: f64,
    pub license: LicenseType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: ContentMetadata,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("content title must not be empty"));
        }
        if self.uri.trim().is_empty() {
            return Err(DomainError::validation("content uri must not be empty"));
        }
        if self.duration_min < 0 {
            return Err(DomainError::validation(format!(
                "durationMin must be >= 0, got {}",
                self.duration_min
            )));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(DomainError::validation(format!(
                "cost must be >= 0, got {}",
                self.cost
            )));
        }
        Ok(())
    }
}
