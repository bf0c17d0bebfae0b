//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check and fallback endpoints
//! - `ws` - WebSocket voice conversation sessions

pub mod api;
pub mod ws;

// Re-export commonly used handlers for convenient access
pub use ws::asr_stream_handler;
