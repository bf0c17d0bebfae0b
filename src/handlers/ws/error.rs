//! WebSocket error types

use thiserror::Error;

use crate::core::session::SessionError;

/// WebSocket handler error types
#[derive(Debug, Error)]
pub enum WebSocketError {
    /// Outgoing message could not be encoded
    #[error("Failed to serialize message: {0}")]
    Serialization(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl From<serde_json::Error> for WebSocketError {
    fn from(err: serde_json::Error) -> Self {
        WebSocketError::Serialization(err.to_string())
    }
}

impl From<axum::Error> for WebSocketError {
    fn from(err: axum::Error) -> Self {
        WebSocketError::WebSocket(err.to_string())
    }
}

impl From<WebSocketError> for SessionError {
    fn from(err: WebSocketError) -> Self {
        SessionError::Transport(err.to_string())
    }
}
