use thiserror::Error;

/// Failure taxonomy shared by the store, the pure services and the HTTP
/// layer. Every variant is recoverable; callers translate them into
/// user-facing responses.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("prerequisite cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("step effort must be positive, got {effort_min}")]
    InvalidEffort { effort_min: i64 },

    #[error("derived completed hours {computed:.2} exceed plan budget {total:.2}")]
    InconsistentPlan { computed: f64, total: f64 },

    #[error("attempt {attempt_number} exceeds the limit of {max_attempts}")]
    AttemptLimitExceeded {
        attempt_number: i32,
        max_attempts: i32,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} was modified since it was read")]
    Conflict { kind: &'static str, id: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(kind: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            id: id.into(),
        }
    }
}
