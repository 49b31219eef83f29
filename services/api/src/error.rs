//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how it is
//! rendered as an HTTP error envelope.

use crate::config::ConfigError;
use crate::web::protocol::ErrorEnvelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipe_social_core::ports::PortError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core services or ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed request caught at the HTTP boundary.
    #[error("{0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::Validation(_) | PortError::InvalidArgument(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(ErrorEnvelope::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults_map_to_4xx() {
        let validation = ApiError::from(PortError::Validation(vec!["title is required".into()]));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(PortError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("x-user-id header is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn remote_failures_are_server_faults_with_the_original_message() {
        let err = ApiError::from(PortError::Remote("Invalid API key".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Invalid API key");
    }
}
