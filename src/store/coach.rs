use crate::domain::citation::Citation;
use crate::domain::coach::CoachMessage;
use crate::domain::DomainError;

use super::MemoryStore;

impl MemoryStore {
    /// Appends one message to a learner's conversation log together with
    /// any citations backing it.
    pub fn append_message(
        &self,
        message: CoachMessage,
        citations: Vec<Citation>,
    ) -> Result<(CoachMessage, Vec<Citation>), DomainError> {
        message.validate()?;
        for citation in &citations {
            citation.validate()?;
            if citation.message_id.as_deref() != Some(message.id.as_str()) {
                return Err(DomainError::validation(format!(
                    "citation {} must reference the appended message",
                    citation.id
                )));
            }
        }

        let mut inner = self.write();
        inner.learner_exists(&message.learner_id)?;
        for citation in &citations {
            if let Some(step_id) = &citation.step_id {
                if !inner.steps.contains_key(step_id) {
                    return Err(DomainError::not_found("plan step", step_id));
                }
            }
        }

        inner.messages.insert(message.id.clone(), message.clone());
        for citation in &citations {
            inner.citations.insert(citation.id.clone(), citation.clone());
        }
        Ok((message, citations))
    }

    /// Conversation history in chronological order. `limit` keeps the most
    /// recent messages and drops older ones first.
    pub fn messages_for_learner(
        &self,
        learner_id: &str,
        limit: usize,
    ) -> Result<Vec<CoachMessage>, DomainError> {
        let inner = self.read();
        inner.learner_exists(learner_id)?;
        let mut messages: Vec<CoachMessage> = inner
            .messages
            .values()
            .filter(|m| m.learner_id == learner_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }

    pub fn message(&self, id: &str) -> Result<CoachMessage, DomainError> {
        self.read()
            .messages
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("coach message", id))
    }

    /// Citations for one message, strongest confidence first.
    pub fn citations_for_message(&self, message_id: &str) -> Result<Vec<Citation>, DomainError> {
        let inner = self.read();
        if !inner.messages.contains_key(message_id) {
            return Err(DomainError::not_found("coach message", message_id));
        }
        let mut citations: Vec<Citation> = inner
            .citations
            .values()
            .filter(|c| c.message_id.as_deref() == Some(message_id))
            .cloned()
            .collect();
        citations.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(citations)
    }
}
