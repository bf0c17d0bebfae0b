mod conversation;
mod engine;
mod errors;
mod message;


pub use conversation::Conversation;
pub use engine::{DEFAULT_PERSONA, DialogueConfig, DialogueEngine};
pub use errors::{DialogueError, DialogueResult};
pub use message::{Message, Role, ToolCall};
