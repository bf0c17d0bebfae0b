//! Output multiplexer: fans the three outbound event categories into the
//! single client-facing sink.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::errors::{SessionError, SessionResult};

/// Event delivered to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Partial transcript
    Transcript(String),
    /// Assistant text for a completed turn
    Answer(String),
    /// Synthesized audio for a completed turn
    Audio(Bytes),
}

/// Client-facing write half of a session's connection
#[async_trait]
pub trait ClientSink: Send {
    async fn send_event(&mut self, event: OutputEvent) -> SessionResult<()>;

    /// Called once after the last event
    async fn close(&mut self) {}
}

/// Sending halves, one per category
#[derive(Debug, Clone)]
pub struct OutputSenders {
    pub transcripts: mpsc::Sender<String>,
    pub answers: mpsc::Sender<String>,
    pub audio: mpsc::Sender<Bytes>,
}

pub struct OutputMultiplexer {
    transcripts: mpsc::Receiver<String>,
    answers: mpsc::Receiver<String>,
    audio: mpsc::Receiver<Bytes>,
}

impl OutputMultiplexer {
    pub fn new(capacity: usize) -> (OutputSenders, Self) {
        let (transcripts_tx, transcripts) = mpsc::channel(capacity);
        let (answers_tx, answers) = mpsc::channel(capacity);
        let (audio_tx, audio) = mpsc::channel(capacity);
        (
            OutputSenders {
                transcripts: transcripts_tx,
                answers: answers_tx,
                audio: audio_tx,
            },
            Self {
                transcripts,
                answers,
                audio,
            },
        )
    }

    /// Write events as they arrive until cancellation or until every sender
    /// is gone, then flush what is still buffered.
    ///
    /// A failed write cancels the session and is returned as a transport error.
    pub async fn run<S: ClientSink>(
        mut self,
        mut sink: S,
        cancel: CancellationToken,
    ) -> SessionResult<()> {
        let (mut transcripts_open, mut answers_open, mut audio_open) = (true, true, true);

        let result = loop {
            if !(transcripts_open || answers_open || audio_open) {
                break Ok(());
            }

            let event = tokio::select! {
                _ = cancel.cancelled() => break self.drain(&mut sink).await,
                text = self.transcripts.recv(), if transcripts_open => match text {
                    Some(text) => OutputEvent::Transcript(text),
                    None => {
                        transcripts_open = false;
                        continue;
                    }
                },
                text = self.answers.recv(), if answers_open => match text {
                    Some(text) => OutputEvent::Answer(text),
                    None => {
                        answers_open = false;
                        continue;
                    }
                },
                audio = self.audio.recv(), if audio_open => match audio {
                    Some(audio) => OutputEvent::Audio(audio),
                    None => {
                        audio_open = false;
                        continue;
                    }
                },
            };

            if let Err(e) = sink.send_event(event).await {
                error!("Client write failed: {}", e);
                cancel.cancel();
                break Err(e);
            }
        };

        sink.close().await;
        debug!("Output multiplexer stopped");
        result
    }

    /// Flush only already-buffered events
    async fn drain<S: ClientSink>(&mut self, sink: &mut S) -> SessionResult<()> {
        let mut pending = Vec::new();
        while let Ok(text) = self.transcripts.try_recv() {
            pending.push(OutputEvent::Transcript(text));
        }
        while let Ok(text) = self.answers.try_recv() {
            pending.push(OutputEvent::Answer(text));
        }
        while let Ok(audio) = self.audio.try_recv() {
            pending.push(OutputEvent::Audio(audio));
        }

        if !pending.is_empty() {
            debug!("Flushing {} buffered events", pending.len());
        }
        for event in pending {
            sink.send_event(event)
                .await
                .map_err(|e| SessionError::Transport(format!("flush failed: {e}")))?;
        }
        Ok(())
    }
}
