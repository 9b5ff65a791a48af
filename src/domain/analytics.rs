use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentType;

/// Aggregate progress metrics. Never stored; derived on demand from plans,
/// steps, attempts and calendar events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub learner_progress: LearnerProgress,
    pub skill_mastery: Vec<SkillMastery>,
    pub learning_patterns: LearningPatterns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
    pub total_skills: usize,
    pub completed_skills: usize,
    pub total_hours: f64,
    pub completed_hours: f64,
    pub weekly_progress: f64,
    pub current_streak_days: i64,
    pub average_daily_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMastery {
    pub skill_id: String,
    pub skill_name: String,
    pub mastery_level: f64,
    pub last_assessed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub hour: u32,
    pub frequency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeShare {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPatterns {
    pub preferred_time_slots: Vec<TimeSlot>,
    pub preferred_content_types: Vec<ContentTypeShare>,
    pub average_session_duration: f64,
    pub completion_rate: f64,
}
