//! Per-session worker tasks.
//!
//! Each worker owns the receiving end of one typed queue and exits when the
//! session's cancellation token fires or its input closes.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::params::SharedParams;
use super::trigger::TriggerCommand;
use crate::core::dialogue::DialogueEngine;
use crate::core::stt::RecognitionTransport;
use crate::core::tts::SynthesisTransport;

/// Work items for the dialogue worker, processed strictly in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueCommand {
    Init { system: String, user: String },
    Turn(String),
}

/// Send `item` unless the session is cancelled first
async fn send_or_cancel<T>(
    tx: &mpsc::Sender<T>,
    item: T,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

/// Drive the recognition transport for the session's lifetime.
///
/// Returning before cancellation, with or without an error, ends the session.
pub async fn run_recognizer(
    recognizer: Arc<dyn RecognitionTransport>,
    audio: mpsc::Receiver<Bytes>,
    transcripts: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    info!("Starting recognition via {}", recognizer.provider_info());
    match recognizer.start_stream(cancel, audio, transcripts).await {
        Ok(()) => debug!("Recognition stream finished"),
        Err(e) => error!("Recognition stream failed: {}", e),
    }
}

/// Feed each transcript into the trigger actor, then echo it to the client
pub async fn run_transcript_worker(
    mut transcripts: mpsc::Receiver<String>,
    trigger: mpsc::Sender<TriggerCommand>,
    client: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        let text = tokio::select! {
            _ = cancel.cancelled() => break,
            text = transcripts.recv() => match text {
                Some(text) => text,
                None => break,
            },
        };
        if text.is_empty() {
            continue;
        }

        debug!("Transcript fragment: {}", text);
        if !send_or_cancel(&trigger, TriggerCommand::Fragment(text.clone()), &cancel).await {
            break;
        }
        if !send_or_cancel(&client, text, &cancel).await {
            break;
        }
    }
    debug!("Transcript worker stopped");
}

/// Own the dialogue engine and run queued commands one at a time.
///
/// Each answer goes to both the client and the synthesis queue.
pub async fn run_dialogue_worker(
    mut engine: DialogueEngine,
    mut commands: mpsc::Receiver<DialogueCommand>,
    answers: mpsc::Sender<String>,
    synthesis: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            DialogueCommand::Init { system, user } => {
                engine.init_conversation(&system, &user);
                info!("Conversation re-initialized");
            }
            DialogueCommand::Turn(utterance) => {
                info!("Running turn for: {}", utterance);
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => break,
                    outcome = engine.run_turn(&utterance) => outcome,
                };

                match outcome {
                    Ok(Some(answer)) => {
                        info!("Assistant answer: {}", answer);
                        if !send_or_cancel(&answers, answer.clone(), &cancel).await {
                            break;
                        }
                        if !send_or_cancel(&synthesis, answer, &cancel).await {
                            break;
                        }
                    }
                    Ok(None) => debug!("Turn produced no text"),
                    Err(e) => error!("Dialogue turn failed: {}", e),
                }
            }
        }
    }
    debug!("Dialogue worker stopped");
}

/// Synthesize answers in arrival order with a fresh parameter snapshot each
pub async fn run_synthesis_worker(
    synthesizer: Arc<dyn SynthesisTransport>,
    speaker: String,
    params: SharedParams,
    mut texts: mpsc::Receiver<String>,
    audio: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
) {
    loop {
        let text = tokio::select! {
            _ = cancel.cancelled() => break,
            text = texts.recv() => match text {
                Some(text) => text,
                None => break,
            },
        };

        let snapshot = params.snapshot();
        let request = synthesizer.synthesize(&text, &speaker, snapshot);
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = request => result,
        };

        match result {
            Ok(data) => {
                debug!("Synthesized {} bytes", data.len());
                if !send_or_cancel(&audio, data, &cancel).await {
                    break;
                }
            }
            Err(e) => warn!("Synthesis failed, answer delivered without audio: {}", e),
        }
    }
    debug!("Synthesis worker stopped");
}
