//! In-memory repository for every entity type.
//!
//! One record per entity keyed by id. Writes take the store-wide lock,
//! re-check every invariant against current state and either commit the
//! whole change or reject it; readers get cloned snapshots. Optimistic
//! concurrency: an update carrying the `updated_at` the caller last read is
//! rejected with a conflict when the stored record moved on.

mod assessments;
mod calendar;
mod catalog;
mod coach;
mod identity;
mod plans;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::assessment::{Assessment, AssessmentAttempt};
use crate::domain::calendar::CalendarEvent;
use crate::domain::citation::Citation;
use crate::domain::coach::CoachMessage;
use crate::domain::content::{ContentItem, ContentProvider};
use crate::domain::learner::Learner;
use crate::domain::plan::{LearningPlan, PlanStep};
use crate::domain::skill::{Skill, SkillEdge};
use crate::domain::user::User;
use crate::domain::DomainError;

#[derive(Default)]
pub(crate) struct StoreInner {
    pub(crate) users: HashMap<String, User>,
    pub(crate) learners: HashMap<String, Learner>,
    pub(crate) skills: HashMap<String, Skill>,
    pub(crate) skill_edges: HashMap<String, SkillEdge>,
    pub(crate) providers: HashMap<String, ContentProvider>,
    pub(crate) content_items: HashMap<String, ContentItem>,
    pub(crate) plans: HashMap<String, LearningPlan>,
    pub(crate) steps: HashMap<String, PlanStep>,
    pub(crate) assessments: HashMap<String, Assessment>,
    pub(crate) attempts: HashMap<String, AssessmentAttempt>,
    pub(crate) messages: HashMap<String, CoachMessage>,
    pub(crate) citations: HashMap<String, Citation>,
    pub(crate) events: HashMap<String, CalendarEvent>,
}

impl StoreInner {
    pub(crate) fn learner_exists(&self, id: &str) -> Result<(), DomainError> {
        if self.learners.contains_key(id) {
            Ok(())
        } else {
            Err(DomainError::not_found("learner", id))
        }
    }

    pub(crate) fn skill_exists(&self, id: &str) -> Result<(), DomainError> {
        if self.skills.contains_key(id) {
            Ok(())
        } else {
            Err(DomainError::not_found("skill", id))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write()
    }

    /// Everything analytics needs about one learner, cloned in one read.
    pub fn learner_snapshot(&self, learner_id: &str) -> Result<LearnerSnapshot, DomainError> {
        let inner = self.read();
        inner.learner_exists(learner_id)?;

        let plans: Vec<LearningPlan> = inner
            .plans
            .values()
            .filter(|p| p.learner_id == learner_id)
            .cloned()
            .collect();
        let plan_ids: Vec<&str> = plans.iter().map(|p| p.id.as_str()).collect();
        let steps: Vec<PlanStep> = inner
            .steps
            .values()
            .filter(|s| plan_ids.contains(&s.plan_id.as_str()))
            .cloned()
            .collect();
        let assessments: Vec<Assessment> = inner
            .assessments
            .values()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect();
        let attempts: Vec<AssessmentAttempt> = inner
            .attempts
            .values()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect();
        let events: Vec<CalendarEvent> = inner
            .events
            .values()
            .filter(|e| e.learner_id == learner_id)
            .cloned()
            .collect();

        Ok(LearnerSnapshot {
            plans,
            steps,
            assessments,
            attempts,
            skills: inner.skills.values().cloned().collect(),
            content: inner.content_items.values().cloned().collect(),
            events,
        })
    }
}

pub struct LearnerSnapshot {
    pub plans: Vec<LearningPlan>,
    pub steps: Vec<PlanStep>,
    pub assessments: Vec<Assessment>,
    pub attempts: Vec<AssessmentAttempt>,
    pub skills: Vec<Skill>,
    pub content: Vec<ContentItem>,
    pub events: Vec<CalendarEvent>,
}

/// Optimistic-concurrency gate shared by all update paths.
pub(crate) fn ensure_unmodified(
    kind: &'static str,
    id: &str,
    stored: DateTime<Utc>,
    expected: Option<DateTime<Utc>>,
) -> Result<(), DomainError> {
    match expected {
        Some(seen) if seen != stored => Err(DomainError::conflict(kind, id)),
        _ => Ok(()),
    }
}
