use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::base::{RecognitionTransport, STTError, STTResult};

/// 40ms of 16kHz mono 16-bit PCM
pub const DEFAULT_CHUNK_BYTES: usize = 1280;
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(40);
/// Frames the recognizer pulls ahead of the send ticker
const MAX_BUFFERED_FRAMES: usize = 4;

/// Configuration for the streaming WebSocket recognizer
#[derive(Debug, Clone)]
pub struct StreamingRecognizerConfig {
    /// Fully signed `ws://` or `wss://` URL of the recognizer
    pub url: String,
    /// Bytes sent per tick
    pub chunk_bytes: usize,
    pub send_interval: Duration,
}

impl Default for StreamingRecognizerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            send_interval: DEFAULT_SEND_INTERVAL,
        }
    }
}

/// Re-slices arbitrarily sized audio pushes into fixed-size frames
#[derive(Debug)]
pub struct AudioFramer {
    buffer: BytesMut,
    chunk_bytes: usize,
}

impl AudioFramer {
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            chunk_bytes: chunk_bytes.max(1),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Exactly `chunk_bytes` if that much is buffered
    pub fn next_chunk(&mut self) -> Option<Bytes> {
        (self.buffer.len() >= self.chunk_bytes)
            .then(|| self.buffer.split_to(self.chunk_bytes).freeze())
    }

    /// Whatever is left, regardless of size
    pub fn take_remaining(&mut self) -> Option<Bytes> {
        (!self.buffer.is_empty()).then(|| self.buffer.split().freeze())
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[derive(Debug, Deserialize)]
struct RecognizerReply {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Option<RecognizerResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizerResult {
    #[serde(default)]
    voice_text_str: String,
}

/// Extract the transcript from one recognizer reply.
///
/// `Ok(None)` for replies that carry no text (handshake acks, empty slices).
pub fn parse_transcript(payload: &str) -> STTResult<Option<String>> {
    let reply: RecognizerReply = serde_json::from_str(payload)
        .map_err(|e| STTError::ProtocolError(format!("undecodable reply: {e}")))?;

    if reply.code != 0 {
        return Err(STTError::ProtocolError(format!(
            "recognizer returned code {}: {}",
            reply.code, reply.message
        )));
    }

    Ok(reply
        .result
        .map(|r| r.voice_text_str)
        .filter(|text| !text.is_empty()))
}

/// Send whatever audio is buffered, then the end-of-stream marker
async fn finish_stream<S>(sink: &mut S, framer: &mut AudioFramer)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    if let Some(rest) = framer.take_remaining() {
        debug!("Flushing {} trailing audio bytes", rest.len());
        if let Err(e) = sink.send(Message::Binary(rest)).await {
            warn!("Failed to flush trailing audio: {}", e);
        }
    }
    let end = serde_json::json!({"type": "end"}).to_string();
    if let Err(e) = sink.send(Message::Text(end.into())).await {
        warn!("Failed to send end-of-stream marker: {}", e);
    }
    let _ = sink.close().await;
}

/// WebSocket recognizer client pacing audio at a fixed frame rate
pub struct StreamingRecognizer {
    config: StreamingRecognizerConfig,
}

impl StreamingRecognizer {
    pub fn new(config: StreamingRecognizerConfig) -> STTResult<Self> {
        if config.url.is_empty() {
            return Err(STTError::ConfigurationError(
                "recognizer URL is required".to_string(),
            ));
        }
        if config.chunk_bytes == 0 {
            return Err(STTError::ConfigurationError(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl RecognitionTransport for StreamingRecognizer {
    async fn start_stream(
        &self,
        cancel: CancellationToken,
        mut audio: mpsc::Receiver<Bytes>,
        transcripts: mpsc::Sender<String>,
    ) -> STTResult<()> {
        let (ws_stream, _) = connect_async(self.config.url.as_str())
            .await
            .map_err(|e| STTError::ConnectionFailed(e.to_string()))?;
        info!("Connected to recognizer");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let mut framer = AudioFramer::new(self.config.chunk_bytes);
        let max_buffered = self.config.chunk_bytes * MAX_BUFFERED_FRAMES;
        let mut ticker = tokio::time::interval(self.config.send_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut audio_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = ticker.tick() => {
                    if let Some(frame) = framer.next_chunk() {
                        ws_sink
                            .send(Message::Binary(frame))
                            .await
                            .map_err(|e| STTError::NetworkError(format!("failed to send audio: {e}")))?;
                    }
                }

                // backlog beyond a few frames stays in the bounded queue
                chunk = audio.recv(), if audio_open && framer.buffered() < max_buffered => {
                    match chunk {
                        Some(data) => framer.push(&data),
                        None => {
                            debug!("Audio source closed");
                            audio_open = false;
                        }
                    }
                }

                message = ws_stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => match parse_transcript(text.as_str()) {
                            Ok(Some(transcript)) => {
                                debug!("Recognized: {}", transcript);
                                if transcripts.send(transcript).await.is_err() {
                                    debug!("Transcript receiver dropped");
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => warn!("Skipping recognizer reply: {}", e),
                        },
                        Some(Ok(Message::Close(frame))) => {
                            return Err(STTError::ConnectionFailed(format!(
                                "recognizer closed the stream: {frame:?}"
                            )));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(STTError::NetworkError(e.to_string()));
                        }
                        None => {
                            return Err(STTError::ConnectionFailed(
                                "recognizer stream ended".to_string(),
                            ));
                        }
                    }
                }
            }
        }

        finish_stream(&mut ws_sink, &mut framer).await;
        info!("Recognizer stream closed");
        Ok(())
    }

    fn provider_info(&self) -> &'static str {
        "Streaming WebSocket recognizer"
    }
}
