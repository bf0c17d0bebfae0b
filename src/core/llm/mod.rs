mod base;
pub mod openai;

// Re-export public types and traits
pub use base::{LlmError, LlmResult, ModelTransport, ToolDefinition};

// Re-export the OpenAI-compatible implementation
pub use openai::{OpenAIChatConfig, OpenAIChatTransport};
