//! Synchronization core error type

use parley_core::DomainError;
use parley_core::Snowflake;

/// Error type for synchronization operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Domain rule violation or store fault
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Pub/sub transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation against a conversation that is not open on this client
    #[error("Conversation not open: {0}")]
    NotOpen(Snowflake),
}

impl SyncError {
    /// Whether the caller may retry the failed operation
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Domain(e) => e.is_retryable(),
            Self::Transport(_) => true,
            Self::NotOpen(_) => false,
        }
    }

    /// Whether this is a permission failure
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_permission())
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
