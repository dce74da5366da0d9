//! # AppError
//!
//! Centralized error handling for the club board.
//! Every workflow failure is one of these variants; the HTTP layer maps
//! them to status codes and a plain message.

use thiserror::Error;

/// The primary error type for all cb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Club, Thread, Response)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Missing or malformed input (e.g., empty title, oversized upload)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Supplied password does not match the stored one
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Legacy response without a delete password, or a thread's opening response
    #[error("not deletable: {0}")]
    NotDeletable(String),

    /// Persistence failure (e.g., SQLite locked, constraint violation)
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// Image pipeline failure (decode, encode or write)
    #[error("upload failure: {0}")]
    UploadFailure(String),

    /// A storage or media operation exceeded its time budget
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Anything else (e.g., template rendering)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }

    /// Builds the validation error listing every missing field.
    pub fn missing_fields(fields: &[&str]) -> Self {
        AppError::ValidationError(format!("required field(s) missing: {}", fields.join(", ")))
    }

    /// True for failures caused by the server rather than the request.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AppError::StorageFailure(_)
                | AppError::UploadFailure(_)
                | AppError::Timeout(_)
                | AppError::Internal(_)
        )
    }
}

/// A specialized Result type for club board logic.
pub type Result<T> = std::result::Result<T, AppError>;
