#![allow(dead_code)]

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Validation(_) => Self::validation(message),
            DomainError::InvalidEffort { .. } => {
                Self::operational(StatusCode::BAD_REQUEST, "INVALID_EFFORT", message)
            }
            DomainError::Cycle { .. } => {
                Self::operational(StatusCode::UNPROCESSABLE_ENTITY, "CYCLE_DETECTED", message)
            }
            DomainError::AttemptLimitExceeded { .. } => Self::operational(
                StatusCode::UNPROCESSABLE_ENTITY,
                "ATTEMPT_LIMIT_EXCEEDED",
                message,
            ),
            DomainError::NotFound { .. } => Self::not_found(message),
            DomainError::Conflict { .. } => Self::conflict(message),
            // A derived value breaking its bound means the stored records
            // are corrupt, not that the request was wrong.
            DomainError::InconsistentPlan { .. } => Self::operational(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INCONSISTENT_PLAN",
                message,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError {
        status,
        code: code.into(),
        message: message.into(),
        is_operational: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_statuses() {
        let cases = [
            (
                AppError::from(DomainError::validation("bad input")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(DomainError::Cycle {
                    path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(DomainError::not_found("plan", "p-1")),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(DomainError::conflict("plan", "p-1")),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(DomainError::InconsistentPlan {
                    computed: 130.0,
                    total: 120.0,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status, status);
        }
    }
}
