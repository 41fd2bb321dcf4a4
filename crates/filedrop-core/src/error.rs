//! Error types module
//!
//! All errors surfaced by the registry core are unified under the `AppError`
//! enum. Snapshot failures carry their message as a string so that the store
//! crate can stay decoupled from this one; the conversion lives on the store
//! side.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Identifier space exhausted for kind '{0}'")]
    IdSpaceExhausted(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl AppError {
    /// Get the error type name for detailed error reporting
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::PermissionDenied(_) => "PermissionDenied",
            AppError::MalformedEvent(_) => "MalformedEvent",
            AppError::Snapshot(_) => "Snapshot",
            AppError::IdSpaceExhausted(_) => "IdSpaceExhausted",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Whether the operation that produced this error can be retried.
    ///
    /// Snapshot failures are transient (the in-memory registry remains the
    /// source of truth until the next successful persist); an exhausted
    /// identifier space is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Snapshot(_) | AppError::Internal(_))
    }
}
