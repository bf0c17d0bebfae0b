//! Error types for dialogue turns

use std::time::Duration;

use crate::core::llm::LlmError;

/// Reasons a dialogue turn fails. Tool failures never appear here; they are
/// recorded in the conversation as tool-role messages instead.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("Model error: {0}")]
    Model(#[from] LlmError),
    #[error("Model completion timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for dialogue operations
pub type DialogueResult<T> = Result<T, DialogueError>;
