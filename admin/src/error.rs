//! Admin tooling error handling
//!
//! This module provides the unified error type for backend calls,
//! completion providers and local input.

use ckn_admin_shared::{ContentError, QuizError};
use thiserror::Error;

/// Error type returned by repositories, providers and services
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Completion provider error: {0}")]
    Provider(String),

    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AdminError {
    /// Map a non-success HTTP status and body to an error
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => AdminError::Unauthorized(message),
            404 => AdminError::NotFound(message),
            code => AdminError::Backend {
                status: code,
                message,
            },
        }
    }

    /// Whether the error means the requested row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::NotFound(_))
    }
}

impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AdminError::Validation(errors.to_string())
    }
}

/// Result type alias for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_unauthorized_status() {
        let error = AdminError::from_status(StatusCode::UNAUTHORIZED, "JWT expired".to_string());
        assert!(matches!(error, AdminError::Unauthorized(_)));

        let error = AdminError::from_status(StatusCode::FORBIDDEN, "RLS".to_string());
        assert!(matches!(error, AdminError::Unauthorized(_)));
    }

    #[test]
    fn test_not_found_status() {
        let error = AdminError::from_status(StatusCode::NOT_FOUND, "no table".to_string());
        assert!(error.is_not_found());
    }

    #[test]
    fn test_other_status_keeps_code() {
        let error = AdminError::from_status(StatusCode::CONFLICT, "duplicate key".to_string());
        match error {
            AdminError::Backend { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "duplicate key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
