//! Error types for session operations

use crate::core::stt::STTError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Recognition error: {0}")]
    Recognition(#[from] STTError),
    #[error("Worker error: {0}")]
    Worker(String),
    #[error("Session is closed")]
    Closed,
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
