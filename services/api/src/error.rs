//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use crate::config::ConfigError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;
use tutoring_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to run the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required field is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Get the HTTP status code and machine-readable code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized | Self::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            Self::Port(PortError::Forbidden(_)) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Port(PortError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Port(PortError::Conflict(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Validation(_) | Self::Port(PortError::Invalid(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized | Self::Port(PortError::Unauthorized) => {
                "Authentication required".to_string()
            }
            Self::Port(PortError::Forbidden(reason)) => format!("Forbidden: {}", reason),
            Self::Port(PortError::NotFound(what)) => format!("{} not found", what),
            Self::Port(PortError::Conflict(what)) => what.clone(),
            Self::Validation(message) | Self::Port(PortError::Invalid(message)) => message.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Detail stays in the logs.
            error!("Request failed: {}", self);
        }
        let body = serde_json::json!({
            "error": code,
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthorized.status().0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(PortError::Forbidden("x".into())).status().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(PortError::NotFound("Note".into())).status().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::validation("name is required").status().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(PortError::Unexpected("pool timed out".into())).status().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_detail_is_not_leaked() {
        let err = ApiError::from(PortError::Unexpected("password=hunter2".into()));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
