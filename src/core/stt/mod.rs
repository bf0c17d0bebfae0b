mod base;
pub mod streaming;

// Re-export public types and traits
pub use base::{RecognitionTransport, STTError, STTResult};

// Re-export the WebSocket recognizer
pub use streaming::{AudioFramer, StreamingRecognizer, StreamingRecognizerConfig};
