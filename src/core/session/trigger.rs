//! Silence/trigger detection.
//!
//! [`TriggerState`] holds the timing bookkeeping and the transcript buffer and
//! decides when an utterance is complete. It is owned by a single actor task
//! ([`run_trigger_actor`]); fragments, manual triggers and resets reach it as
//! [`TriggerCommand`]s, so the timer path and the command path never race.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::transcript::TranscriptAggregator;
use super::workers::DialogueCommand;

pub const DEFAULT_SILENCE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct TriggerPolicy {
    pub silence_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            silence_timeout: DEFAULT_SILENCE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct TriggerState {
    policy: TriggerPolicy,
    transcript: TranscriptAggregator,
    last_audio: Option<Instant>,
    last_turn: Option<Instant>,
    last_check: Option<Instant>,
}

impl TriggerState {
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            policy,
            transcript: TranscriptAggregator::new(),
            last_audio: None,
            last_turn: None,
            last_check: None,
        }
    }

    /// Buffer a recognized fragment and mark speech activity
    pub fn record_fragment(&mut self, text: impl Into<String>, now: Instant) {
        self.transcript.push(text, now);
        self.last_audio = Some(now);
    }

    /// Timer path: fire once silence has lasted longer than the timeout
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let last_audio = self.last_audio?;
        let timeout = self.policy.silence_timeout;

        let silent = now.duration_since(last_audio) > timeout;
        let checked_long_ago = self
            .last_check
            .is_none_or(|check| now.duration_since(check) > timeout);
        let spoke_since_turn = self.last_turn.is_none_or(|turn| last_audio > turn);

        if silent && checked_long_ago && spoke_since_turn && !self.transcript.is_empty() {
            self.take_utterance(now)
        } else {
            None
        }
    }

    /// Command path: fire immediately if anything is buffered
    pub fn manual(&mut self, now: Instant) -> Option<String> {
        self.take_utterance(now)
    }

    /// Drop buffered fragments and restart the silence clock
    pub fn reset(&mut self, now: Instant) {
        self.transcript.clear();
        self.last_audio = Some(now);
    }

    pub fn buffered(&self) -> usize {
        self.transcript.len()
    }

    fn take_utterance(&mut self, now: Instant) -> Option<String> {
        let utterance = self.transcript.take_last()?;
        self.last_turn = Some(now);
        self.last_check = Some(now);
        Some(utterance)
    }
}

/// Messages accepted by the trigger actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerCommand {
    Fragment(String),
    Manual,
    /// Clear state and re-seed the conversation
    Reinit { system: String, user: String },
}

/// Own `state` until cancellation, forwarding fired utterances and
/// re-initializations to the dialogue queue in the order they happen.
pub async fn run_trigger_actor(
    mut state: TriggerState,
    mut commands: mpsc::Receiver<TriggerCommand>,
    dialogue: mpsc::Sender<DialogueCommand>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(state.policy.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,

            command = commands.recv() => {
                let Some(command) = command else { break };
                let now = Instant::now();
                match command {
                    TriggerCommand::Fragment(text) => {
                        state.record_fragment(text, now);
                        None
                    }
                    TriggerCommand::Manual => {
                        let fired = state.manual(now);
                        if fired.is_none() {
                            info!("Manual trigger with empty transcript, skipping");
                        }
                        fired.map(DialogueCommand::Turn)
                    }
                    TriggerCommand::Reinit { system, user } => {
                        state.reset(now);
                        Some(DialogueCommand::Init { system, user })
                    }
                }
            }

            _ = ticker.tick() => {
                let fired = state.poll(Instant::now());
                if fired.is_some() {
                    info!("Silence detected, starting turn");
                }
                fired.map(DialogueCommand::Turn)
            }
        };

        if let Some(command) = next {
            debug!("Queueing dialogue command: {:?}", command);
            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = dialogue.send(command) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    }

    debug!("Trigger actor stopped");
}
