//! # WebSocket Conversation Handler Module
//!
//! Each connection to `/asr-stream` runs one voice conversation
//! [`Session`](crate::core::session::Session).
//!
//! ## WebSocket API
//!
//! **Incoming Messages:**
//! - **Binary messages** - Raw audio for recognition
//! - `{"type": "init", "system": "...", "user": "..."}` - Reset the conversation; empty or missing fields use the server defaults
//! - `{"type": "go"}` - Answer the buffered speech now instead of waiting for silence
//! - `{"type": "up"}` / `{"type": "down"}` - Raise or lower the synthesis volume
//! - `{"type": "fast"}` / `{"type": "late"}` - Raise or lower the synthesis speed
//! - `{"type": "hangup"}` - End the session
//!
//! Unknown `type` values and malformed JSON are logged and ignored.
//!
//! **Outgoing Messages:**
//! - `{"asrReturn": "..."}` - Partial transcript, as recognized
//! - `{"answer": "..."}` - Assistant reply for a completed turn
//! - **Binary messages** - Synthesized audio for the reply
//!
//! ## Rust Client Example
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use serde_json::json;
//! use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (ws_stream, _) = connect_async("ws://localhost:8080/asr-stream").await?;
//!     let (mut write, mut read) = ws_stream.split();
//!
//!     let init = json!({"type": "init", "system": "你是一个人工智能小助手"});
//!     write.send(Message::Text(init.to_string().into())).await?;
//!     write.send(Message::Binary(vec![0u8; 3200].into())).await?;
//!
//!     while let Some(message) = read.next().await {
//!         match message? {
//!             Message::Text(text) => println!("event: {text}"),
//!             Message::Binary(audio) => println!("audio: {} bytes", audio.len()),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod messages;


// Re-export commonly used items
pub use error::WebSocketError;
pub use handler::{WsSink, asr_stream_handler};
pub use messages::{MessageRoute, OutgoingMessage, inbound_frame};
