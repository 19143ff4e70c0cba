//! Application error types
//!
//! Unified error handling at the application boundary. Library code keeps
//! its typed errors; this is what the hosting application reports upward.

use parley_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authorization errors
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Stable machine-readable code for logs and API payloads
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Whether the caller may retry the failed operation
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Transport(_) => true,
            Self::Domain(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias using `AppError`
pub type AppResult<T> = Result<T, AppError>;
