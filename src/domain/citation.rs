use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Provenance link from a coach message or plan step to a span inside a
/// source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub document_id: String,
    pub quote: String,
    pub span_start: i64,
    pub span_end: i64,
    pub url: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Citation {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.step_id.is_none() && self.message_id.is_none() {
            return Err(DomainError::validation(
                "citation must reference a step or a message",
            ));
        }
        if self.span_start < 0 || self.span_start > self.span_end {
            return Err(DomainError::validation(format!(
                "citation span [{}, {}] is not a valid range",
                self.span_start, self.span_end
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DomainError::validation(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.document_id.trim().is_empty() {
            return Err(DomainError::validation("documentId must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_span_rejected() {
        let now = Utc::now();
        let citation = Citation {
            id: "c-1".to_string(),
            step_id: None,
            message_id: Some("m-1".to_string()),
            document_id: "doc-1".to_string(),
            quote: "closures capture their environment".to_string(),
            span_start: 120,
            span_end: 80,
            url: "https://doc.rust-lang.org/book/ch13-01-closures.html".to_string(),
            confidence: 0.9,
            created_at: now,
            updated_at: now,
        };
        assert!(citation.validate().is_err());
    }
}
