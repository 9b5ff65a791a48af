use chrono::{DateTime, Utc};

use crate::domain::calendar::CalendarEvent;
use crate::domain::DomainError;

use super::{ensure_unmodified, MemoryStore};

impl MemoryStore {
    pub fn create_event(&self, event: CalendarEvent) -> Result<CalendarEvent, DomainError> {
        event.validate()?;

        let mut inner = self.write();
        inner.learner_exists(&event.learner_id)?;
        if let Some(step_id) = &event.plan_step_id {
            if !inner.steps.contains_key(step_id) {
                return Err(DomainError::not_found("plan step", step_id));
            }
        }

        inner.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    pub fn event(&self, id: &str) -> Result<CalendarEvent, DomainError> {
        self.read()
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("calendar event", id))
    }

    pub fn events_for_learner(
        &self,
        learner_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, DomainError> {
        let inner = self.read();
        inner.learner_exists(learner_id)?;
        let mut events: Vec<CalendarEvent> = inner
            .events
            .values()
            .filter(|e| e.learner_id == learner_id)
            .filter(|e| from.map_or(true, |f| e.start_at >= f))
            .filter(|e| to.map_or(true, |t| e.end_at <= t))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start_at.cmp(&b.start_at));
        Ok(events)
    }

    pub fn update_event(
        &self,
        mut event: CalendarEvent,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<CalendarEvent, DomainError> {
        event.validate()?;

        let mut inner = self.write();
        let stored = inner
            .events
            .get(&event.id)
            .ok_or_else(|| DomainError::not_found("calendar event", &event.id))?;
        ensure_unmodified("calendar event", &event.id, stored.updated_at, expected_updated_at)?;
        if stored.learner_id != event.learner_id {
            return Err(DomainError::validation("event ownership is immutable"));
        }
        if let Some(step_id) = &event.plan_step_id {
            if !inner.steps.contains_key(step_id) {
                return Err(DomainError::not_found("plan step", step_id));
            }
        }

        event.created_at = stored.created_at;
        event.updated_at = Utc::now();
        inner.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }
}
