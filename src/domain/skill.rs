use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillDifficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillRelation {
    Prerequisite,
    Related,
    Alternative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRange {
    pub min: i32,
    pub max: i32,
}

/// A discrete learnable competency. `prerequisites` holds skill ids; the
/// catalog-wide prerequisite relation must stay acyclic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub slug: String,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub domain: String,
    pub level_range: LevelRange,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub estimated_hours: f64,
    pub difficulty: SkillDifficulty,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skill {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.slug.trim().is_empty() {
            return Err(DomainError::validation("skill slug must not be empty"));
        }
        if self.label.trim().is_empty() {
            return Err(DomainError::validation("skill label must not be empty"));
        }
        if self.level_range.min > self.level_range.max {
            return Err(DomainError::validation(format!(
                "levelRange min {} exceeds max {}",
                self.level_range.min, self.level_range.max
            )));
        }
        if self.estimated_hours < 0.0 {
            return Err(DomainError::validation(format!(
                "estimatedHours must be >= 0, got {}",
                self.estimated_hours
            )));
        }
        if self.prerequisites.iter().any(|p| p == &self.id) {
            return Err(DomainError::validation(format!(
                "skill {} cannot be its own prerequisite",
                self.slug
            )));
        }
        Ok(())
    }
}

/// Weighted relationship between two skills, beyond the plain prerequisite
/// list embedded in [`Skill`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEdge {
    pub id: String,
    pub src_skill_id: String,
    pub dst_skill_id: String,
    pub relation: SkillRelation,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillEdge {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.src_skill_id == self.dst_skill_id {
            return Err(DomainError::validation(format!(
                "skill edge may not loop onto {}",
                self.src_skill_id
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(DomainError::validation(format!(
                "edge weight must be a non-negative number, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}
