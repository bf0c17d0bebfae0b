//! # Recognition Transport Base Trait
//!
//! A recognition transport consumes pushed audio chunks for the lifetime of a
//! session and emits transcript strings as the remote recognizer produces
//! them.
//!
//! ```rust,ignore
//! use bytes::Bytes;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use vocalis::core::stt::RecognitionTransport;
//!
//! async fn transcribe(recognizer: &dyn RecognitionTransport) {
//!     let cancel = CancellationToken::new();
//!     let (audio_tx, audio_rx) = mpsc::channel::<Bytes>(100);
//!     let (text_tx, mut text_rx) = mpsc::channel::<String>(16);
//!
//!     tokio::spawn(async move {
//!         while let Some(text) = text_rx.recv().await {
//!             println!("heard: {text}");
//!         }
//!     });
//!
//!     audio_tx.send(Bytes::from_static(&[0u8; 640])).await.ok();
//!     cancel.cancel();
//!     recognizer.start_stream(cancel, audio_rx, text_tx).await.ok();
//! }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Error types for recognition transports
#[derive(Debug, thiserror::Error)]
pub enum STTError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for recognition operations
pub type STTResult<T> = Result<T, STTError>;

/// Base trait for streaming speech recognizers
#[async_trait]
pub trait RecognitionTransport: Send + Sync {
    /// Stream `audio` to the recognizer until `cancel` fires.
    ///
    /// Transcripts are sent on `transcripts` in the order they arrive. On
    /// cancellation any buffered partial audio is flushed, followed by an
    /// end-of-stream marker, and the call returns `Ok(())`. A failed stream
    /// returns an error without retrying.
    async fn start_stream(
        &self,
        cancel: CancellationToken,
        audio: mpsc::Receiver<Bytes>,
        transcripts: mpsc::Sender<String>,
    ) -> STTResult<()>;

    /// Provider description used in logs
    fn provider_info(&self) -> &'static str;
}
