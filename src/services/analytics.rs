//! Derived progress metrics for one learner.
//!
//! Everything here is computed from snapshots handed in by the caller;
//! nothing is persisted.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};

use crate::domain::analytics::{
    Analytics, ContentTypeShare, LearnerProgress, LearningPatterns, SkillMastery, TimeSlot,
};
use crate::domain::assessment::{Assessment, AssessmentAttempt, AttemptStatus};
use crate::domain::calendar::{CalendarEvent, EventStatus};
use crate::domain::content::ContentItem;
use crate::domain::plan::{LearningPlan, PlanStatus, PlanStep, StepStatus};
use crate::domain::skill::Skill;

const WEEKLY_WINDOW_DAYS: i64 = 7;

// Review horizon widens as mastery firms up.
const REVIEW_DAYS_WEAK: i64 = 3;
const REVIEW_DAYS_FAIR: i64 = 7;
const REVIEW_DAYS_GOOD: i64 = 14;
const REVIEW_DAYS_STRONG: i64 = 30;

pub struct AnalyticsSources<'a> {
    pub plans: &'a [LearningPlan],
    pub steps: &'a [PlanStep],
    pub assessments: &'a [Assessment],
    pub attempts: &'a [AssessmentAttempt],
    pub skills: &'a [Skill],
    pub content: &'a [ContentItem],
    pub events: &'a [CalendarEvent],
}

pub fn learner_analytics(sources: &AnalyticsSources<'_>, now: DateTime<Utc>) -> Analytics {
    Analytics {
        learner_progress: learner_progress(sources, now),
        skill_mastery: skill_mastery(sources),
        learning_patterns: learning_patterns(sources),
    }
}

fn learner_progress(sources: &AnalyticsSources<'_>, now: DateTime<Utc>) -> LearnerProgress {
    // Draft, paused and archived plans stay out of the totals.
    let counted: Vec<&LearningPlan> = sources
        .plans
        .iter()
        .filter(|p| matches!(p.status, PlanStatus::Active | PlanStatus::Completed))
        .collect();
    let counted_ids: HashSet<&str> = counted.iter().map(|p| p.id.as_str()).collect();
    let steps: Vec<&PlanStep> = sources
        .steps
        .iter()
        .filter(|s| counted_ids.contains(s.plan_id.as_str()))
        .collect();

    let total_hours: f64 = counted.iter().map(|p| p.total_hours).sum();
    let completed_hours: f64 = counted.iter().map(|p| p.completed_hours).sum();

    let total_skills: HashSet<&str> = steps.iter().map(|s| s.skill_id.as_str()).collect();
    let completed_skills: HashSet<&str> = steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .map(|s| s.skill_id.as_str())
        .collect();

    let window_start = now - Duration::days(WEEKLY_WINDOW_DAYS);
    let weekly_progress: f64 = steps
        .iter()
        .filter_map(|s| s.completed_at.map(|at| (s, at)))
        .filter(|(_, at)| *at >= window_start && *at <= now)
        .map(|(s, _)| s.effort_min as f64 / 60.0)
        .sum();

    let completion_days: HashSet<NaiveDate> = steps
        .iter()
        .filter_map(|s| s.completed_at)
        .map(|at| at.date_naive())
        .collect();

    let average_daily_hours = if completion_days.is_empty() {
        0.0
    } else {
        completed_hours / completion_days.len() as f64
    };

    LearnerProgress {
        total_skills: total_skills.len(),
        completed_skills: completed_skills.len(),
        total_hours,
        completed_hours,
        weekly_progress,
        current_streak_days: streak_days(&completion_days, now.date_naive()),
        average_daily_hours,
    }
}

/// Consecutive days with at least one completed step, counting back from
/// today (or yesterday, when today has no activity yet).
fn streak_days(completion_days: &HashSet<NaiveDate>, today: NaiveDate) -> i64 {
    let mut cursor = if completion_days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if completion_days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    loop {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) if completion_days.contains(&prev) => cursor = prev,
            _ => return streak,
        }
    }
}

fn review_horizon(mastery: f64) -> Duration {
    let days = if mastery >= 0.9 {
        REVIEW_DAYS_STRONG
    } else if mastery >= 0.7 {
        REVIEW_DAYS_GOOD
    } else if mastery >= 0.5 {
        REVIEW_DAYS_FAIR
    } else {
        REVIEW_DAYS_WEAK
    };
    Duration::days(days)
}

fn skill_mastery(sources: &AnalyticsSources<'_>) -> Vec<SkillMastery> {
    let skill_of_assessment: HashMap<&str, &str> = sources
        .assessments
        .iter()
        .map(|a| (a.id.as_str(), a.skill_id.as_str()))
        .collect();
    let labels: HashMap<&str, &str> = sources
        .skills
        .iter()
        .map(|s| (s.id.as_str(), s.label.as_str()))
        .collect();

    // Latest completed attempt per skill wins; BTreeMap keeps stable output.
    let mut latest: BTreeMap<&str, (&AssessmentAttempt, DateTime<Utc>)> = BTreeMap::new();
    for attempt in sources.attempts {
        if attempt.status != AttemptStatus::Completed {
            continue;
        }
        let Some(skill_id) = skill_of_assessment.get(attempt.assessment_id.as_str()) else {
            continue;
        };
        let assessed_at = attempt.completed_at.unwrap_or(attempt.created_at);
        match latest.get(skill_id) {
            Some((_, existing)) if *existing >= assessed_at => {}
            _ => {
                latest.insert(skill_id, (attempt, assessed_at));
            }
        }
    }

    latest
        .into_iter()
        .map(|(skill_id, (attempt, assessed_at))| SkillMastery {
            skill_id: skill_id.to_string(),
            skill_name: labels.get(skill_id).unwrap_or(&skill_id).to_string(),
            mastery_level: attempt.mastery_prob,
            last_assessed: assessed_at,
            next_review: assessed_at + review_horizon(attempt.mastery_prob),
        })
        .collect()
}

fn learning_patterns(sources: &AnalyticsSources<'_>) -> LearningPatterns {
    let done_events: Vec<&CalendarEvent> = sources
        .events
        .iter()
        .filter(|e| e.status == EventStatus::Completed)
        .collect();

    let mut by_hour: BTreeMap<u32, usize> = BTreeMap::new();
    for event in &done_events {
        *by_hour.entry(event.start_at.hour()).or_default() += 1;
    }
    let mut preferred_time_slots: Vec<TimeSlot> = by_hour
        .into_iter()
        .map(|(hour, frequency)| TimeSlot { hour, frequency })
        .collect();
    preferred_time_slots.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.hour.cmp(&b.hour)));

    let content_types: HashMap<&str, _> = sources
        .content
        .iter()
        .map(|c| (c.id.as_str(), c.content_type))
        .collect();
    let mut type_counts: BTreeMap<crate::domain::content::ContentType, usize> = BTreeMap::new();
    let mut typed_total = 0usize;
    for step in sources.steps {
        if step.status != StepStatus::Completed {
            continue;
        }
        let Some(content_id) = step.content_item_id.as_deref() else {
            continue;
        };
        let Some(content_type) = content_types.get(content_id) else {
            continue;
        };
        typed_total += 1;
        *type_counts.entry(*content_type).or_default() += 1;
    }
    let preferred_content_types: Vec<ContentTypeShare> = type_counts
        .into_iter()
        .map(|(content_type, count)| ContentTypeShare {
            content_type,
            percentage: count as f64 / typed_total as f64 * 100.0,
        })
        .collect();

    let average_session_duration = if done_events.is_empty() {
        0.0
    } else {
        done_events
            .iter()
            .map(|e| e.duration_minutes() as f64)
            .sum::<f64>()
            / done_events.len() as f64
    };

    let total_steps = sources.steps.len();
    let completed_steps = sources
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .count();
    let completion_rate = if total_steps == 0 {
        0.0
    } else {
        completed_steps as f64 / total_steps as f64
    };

    LearningPatterns {
        preferred_time_slots,
        preferred_content_types,
        average_session_duration,
        completion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_counts_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let days: HashSet<NaiveDate> = [
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(streak_days(&days, today), 3);
    }

    #[test]
    fn streak_tolerates_missing_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let days: HashSet<NaiveDate> = [
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(streak_days(&days, today), 2);
    }

    #[test]
    fn streak_is_zero_after_a_gap() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let days: HashSet<NaiveDate> =
            [NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()].into_iter().collect();
        assert_eq!(streak_days(&days, today), 0);
    }

    #[test]
    fn review_horizon_widens_with_mastery() {
        assert!(review_horizon(0.95) > review_horizon(0.75));
        assert!(review_horizon(0.75) > review_horizon(0.55));
        assert!(review_horizon(0.55) > review_horizon(0.2));
    }
}
