//! # Session Orchestrator
//!
//! One [`Session`] per client connection. [`Session::run`] wires the typed
//! queues, spawns the workers, applies control commands and returns only
//! after every worker has exited:
//!
//! ```text
//! inbound audio -> AudioIngest -> recognizer -> transcript worker -> trigger actor
//!                                                      |                  |
//!                                                 asrReturn         dialogue worker -> answer
//!                                                                         |
//!                                                               synthesis worker -> audio
//! ```
//!
//! Everything runs under one cancellation token. `Hangup`, a client close, a
//! failed client write, a worker that stops on its own or
//! [`SessionHandle::stop`] cancel it; the session then moves
//! `Active -> Draining -> Closed`.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::control::ControlCommand;
use super::errors::{SessionError, SessionResult};
use super::ingest::AudioIngest;
use super::output::{ClientSink, OutputMultiplexer};
use super::params::SharedParams;
use super::trigger::{TriggerCommand, TriggerPolicy, TriggerState, run_trigger_actor};
use super::workers::{
    DialogueCommand, run_dialogue_worker, run_recognizer, run_synthesis_worker,
    run_transcript_worker,
};
use crate::core::dialogue::{DialogueConfig, DialogueEngine};
use crate::core::llm::ModelTransport;
use crate::core::stt::RecognitionTransport;
use crate::core::tools::ToolRegistry;
use crate::core::tts::{DEFAULT_SPEAKER, SynthesisParams, SynthesisTransport};

/// Capacity of the internal event queues
const EVENT_QUEUE_CAPACITY: usize = 10;
/// Capacity of the control and trigger queues
const CONTROL_QUEUE_CAPACITY: usize = 32;

pub const DEFAULT_AUDIO_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_SESSION_SYSTEM_PROMPT: &str = "你是一个一个猫娘";
pub const DEFAULT_SESSION_USER_PROMPT: &str = "请在每句话结尾加上'喵~'";

/// Transport clients shared by every session, constructed once at startup
#[derive(Clone)]
pub struct SessionServices {
    pub recognizer: Arc<dyn RecognitionTransport>,
    pub synthesizer: Arc<dyn SynthesisTransport>,
    pub model: Arc<dyn ModelTransport>,
    pub tools: Arc<ToolRegistry>,
}

/// Per-session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub trigger: TriggerPolicy,
    pub audio_queue_capacity: usize,
    /// Prompts a new session starts with and `init` falls back to
    pub system_prompt: String,
    pub user_prompt: String,
    pub speaker: String,
    pub dialogue: DialogueConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerPolicy::default(),
            audio_queue_capacity: DEFAULT_AUDIO_QUEUE_CAPACITY,
            system_prompt: DEFAULT_SESSION_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_SESSION_USER_PROMPT.to_string(),
            speaker: DEFAULT_SPEAKER.to_string(),
            dialogue: DialogueConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Draining,
    Closed,
}

/// One frame read from the client connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Audio(Bytes),
    /// Raw text frame, parsed as a [`ControlCommand`]
    Control(String),
    Close,
}

/// Cloneable remote control for a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    cancel: CancellationToken,
    control_tx: mpsc::Sender<ControlCommand>,
    phase_rx: watch::Receiver<SessionPhase>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cancel the session
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Apply `command` as if it had arrived from the client
    pub async fn send_control(&self, command: ControlCommand) -> SessionResult<()> {
        self.control_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase_rx.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase_rx.clone()
    }
}

/// Control-side state used by the read loop
struct ControlContext {
    trigger_tx: mpsc::Sender<TriggerCommand>,
    params: SharedParams,
    cancel: CancellationToken,
}

pub struct Session {
    id: String,
    services: SessionServices,
    config: SessionConfig,
    cancel: CancellationToken,
    phase_tx: watch::Sender<SessionPhase>,
    control_tx: mpsc::Sender<ControlCommand>,
    control_rx: mpsc::Receiver<ControlCommand>,
    params: SharedParams,
}

impl Session {
    pub fn new(services: SessionServices, config: SessionConfig) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Active);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            services,
            config,
            cancel: CancellationToken::new(),
            phase_tx,
            control_tx,
            control_rx,
            params: SharedParams::new(SynthesisParams::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.id.clone(),
            cancel: self.cancel.clone(),
            control_tx: self.control_tx.clone(),
            phase_rx: self.phase_tx.subscribe(),
        }
    }

    /// Run the session over `inbound` and `sink` until it is torn down.
    ///
    /// Returns a transport error if writing to the client failed and a worker
    /// error if any worker stopped before the session was cancelled.
    pub async fn run<I, S>(self, inbound: I, sink: S) -> SessionResult<()>
    where
        I: Stream<Item = InboundFrame> + Send + Unpin,
        S: ClientSink + 'static,
    {
        let span = info_span!("session", id = %self.id);
        self.run_inner(inbound, sink).instrument(span).await
    }

    async fn run_inner<I, S>(self, mut inbound: I, sink: S) -> SessionResult<()>
    where
        I: Stream<Item = InboundFrame> + Send + Unpin,
        S: ClientSink + 'static,
    {
        let Session {
            services,
            config,
            cancel,
            phase_tx,
            control_tx,
            mut control_rx,
            params,
            ..
        } = self;
        // handles keep their own senders; this one must not hold the queue open
        drop(control_tx);
        info!("Session started");

        let (ingest, audio_rx) = AudioIngest::new(config.audio_queue_capacity);
        let (recognized_tx, recognized_rx) = mpsc::channel::<String>(EVENT_QUEUE_CAPACITY);
        let (trigger_tx, trigger_rx) = mpsc::channel::<TriggerCommand>(CONTROL_QUEUE_CAPACITY);
        let (dialogue_tx, dialogue_rx) = mpsc::channel::<DialogueCommand>(CONTROL_QUEUE_CAPACITY);
        let (synthesis_tx, synthesis_rx) = mpsc::channel::<String>(EVENT_QUEUE_CAPACITY);
        let (outputs, multiplexer) = OutputMultiplexer::new(EVENT_QUEUE_CAPACITY);

        let mut engine = DialogueEngine::new(
            services.model.clone(),
            services.tools.clone(),
            config.dialogue.clone(),
        );
        engine.init_conversation(&config.system_prompt, &config.user_prompt);

        let mut workers = JoinSet::new();
        let current = tracing::Span::current();

        workers.spawn(
            run_recognizer(
                services.recognizer.clone(),
                audio_rx,
                recognized_tx,
                cancel.clone(),
            )
            .instrument(current.clone()),
        );
        workers.spawn(
            run_transcript_worker(
                recognized_rx,
                trigger_tx.clone(),
                outputs.transcripts.clone(),
                cancel.clone(),
            )
            .instrument(current.clone()),
        );
        workers.spawn(
            run_trigger_actor(
                TriggerState::new(config.trigger),
                trigger_rx,
                dialogue_tx,
                cancel.clone(),
            )
            .instrument(current.clone()),
        );
        workers.spawn(
            run_dialogue_worker(
                engine,
                dialogue_rx,
                outputs.answers.clone(),
                synthesis_tx,
                cancel.clone(),
            )
            .instrument(current.clone()),
        );
        workers.spawn(
            run_synthesis_worker(
                services.synthesizer.clone(),
                config.speaker.clone(),
                params.clone(),
                synthesis_rx,
                outputs.audio.clone(),
                cancel.clone(),
            )
            .instrument(current.clone()),
        );
        drop(outputs);

        let output_task = tokio::spawn(multiplexer.run(sink, cancel.clone()).instrument(current));

        let control = ControlContext {
            trigger_tx,
            params,
            cancel: cancel.clone(),
        };

        let mut failure = None;
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(joined) = workers.join_next() => {
                    let reason = match joined {
                        Ok(()) => "worker exited before cancellation".to_string(),
                        Err(e) => format!("worker panicked: {e}"),
                    };
                    error!("Session worker failed, tearing down: {}", reason);
                    failure = Some(SessionError::Worker(reason));
                    break;
                }

                Some(command) = control_rx.recv() => {
                    apply_control(&control, command, &config).await;
                }

                frame = inbound.next() => match frame {
                    Some(InboundFrame::Audio(chunk)) => {
                        ingest.offer(chunk);
                    }
                    Some(InboundFrame::Control(text)) => match ControlCommand::parse(&text) {
                        Ok(command) => apply_control(&control, command, &config).await,
                        Err(e) => warn!("Ignoring malformed control message {:?}: {}", text, e),
                    },
                    Some(InboundFrame::Close) | None => {
                        info!("Client closed the connection");
                        break;
                    }
                },
            }
        }

        phase_tx.send_replace(SessionPhase::Draining);
        info!("Session draining");
        cancel.cancel();
        drop(control);
        drop(ingest);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Session worker panicked: {}", e);
            }
        }

        let outcome = match output_task.await {
            Ok(result) => result,
            Err(e) => Err(SessionError::Worker(format!("output task failed: {e}"))),
        };
        let outcome = match failure {
            Some(e) if outcome.is_ok() => Err(e),
            _ => outcome,
        };

        phase_tx.send_replace(SessionPhase::Closed);
        info!("Session closed");
        outcome
    }
}

/// Apply one control command.
///
/// A full trigger queue drops `go` with a warning so the read loop keeps
/// draining the connection. `init` waits for room instead.
async fn apply_control(context: &ControlContext, command: ControlCommand, config: &SessionConfig) {
    debug!("Control command: {:?}", command);
    match command {
        ControlCommand::Init { system, user } => {
            let system = if system.is_empty() {
                config.system_prompt.clone()
            } else {
                system
            };
            let user = if user.is_empty() {
                config.user_prompt.clone()
            } else {
                user
            };
            info!("Re-initializing conversation: system={}, user={}", system, user);
            deliver(context, TriggerCommand::Reinit { system, user }).await;
        }
        ControlCommand::Hangup => {
            info!("Hangup received, ending session");
            context.cancel.cancel();
        }
        ControlCommand::ManualTrigger => {
            info!("Manual trigger received");
            forward(context, TriggerCommand::Manual);
        }
        ControlCommand::VolumeUp => {
            context.params.adjust_volume(true);
        }
        ControlCommand::VolumeDown => {
            context.params.adjust_volume(false);
        }
        ControlCommand::SpeedUp => {
            context.params.adjust_speed(true);
        }
        ControlCommand::SpeedDown => {
            context.params.adjust_speed(false);
        }
        ControlCommand::Unknown => {
            warn!("Unknown control message type, ignoring");
        }
    }
}

fn forward(context: &ControlContext, command: TriggerCommand) {
    if let Err(e) = context.trigger_tx.try_send(command) {
        warn!("Trigger queue unavailable, dropping command: {}", e);
    }
}

/// Queue `command` once there is room, unless the session ends first
async fn deliver(context: &ControlContext, command: TriggerCommand) {
    tokio::select! {
        _ = context.cancel.cancelled() => debug!("Session ending, re-initialization discarded"),
        sent = context.trigger_tx.send(command) => {
            if sent.is_err() {
                error!("Trigger actor stopped, re-initialization lost");
            }
        }
    }
}
