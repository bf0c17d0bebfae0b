pub mod dialogue;
pub mod llm;
pub mod session;
pub mod stt;
pub mod tools;
pub mod tts;

// Re-export commonly used types for convenience
pub use dialogue::{Conversation, DialogueEngine, DialogueError, Message, Role, ToolCall};

pub use llm::{LlmError, ModelTransport, OpenAIChatTransport, ToolDefinition};

pub use session::{
    ClientSink, ControlCommand, InboundFrame, OutputEvent, Session, SessionConfig, SessionError,
    SessionHandle, SessionPhase, SessionServices,
};

pub use stt::{RecognitionTransport, STTError, StreamingRecognizer};

pub use tools::{Tool, ToolError, ToolRegistry};

pub use tts::{HttpSynthesizer, SynthesisParams, SynthesisTransport, TTSError};
