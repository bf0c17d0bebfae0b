//! # Model Transport Base Trait
//!
//! Abstraction over a conversational model that accepts the full conversation
//! plus a set of callable tool definitions and answers with one assistant
//! message, which may carry zero or more tool calls.
//!
//! ```rust,ignore
//! use vocalis::core::llm::{ModelTransport, ToolDefinition};
//! use vocalis::core::dialogue::Message;
//!
//! async fn ask(model: &dyn ModelTransport) -> Result<(), Box<dyn std::error::Error>> {
//!     let conversation = vec![Message::system("you are helpful"), Message::user("hi")];
//!     let reply = model.complete(&conversation, &[]).await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::dialogue::Message;

/// Model transport error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Model API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to decode model response: {0}")]
    DecodeFailed(String),

    #[error("Model response contained no choices")]
    EmptyResponse,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for model transport operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Declaration of a callable tool, sent to the model with each first-pass completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Names listed under the schema's `required` array
    pub fn required_arguments(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Base trait for conversational model transports
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Request one completion over `conversation`.
    ///
    /// An empty `tools` slice means no tools are offered for this request.
    async fn complete(&self, conversation: &[Message], tools: &[ToolDefinition])
    -> LlmResult<Message>;

    /// Provider description used in logs
    fn provider_info(&self) -> &'static str;
}
