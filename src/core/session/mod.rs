mod control;
mod errors;
mod ingest;
mod orchestrator;
mod output;
mod params;
mod transcript;
mod trigger;
mod workers;

#[cfg(test)]
mod tests;

pub use control::ControlCommand;
pub use errors::{SessionError, SessionResult};
pub use ingest::AudioIngest;
pub use orchestrator::{
    DEFAULT_AUDIO_QUEUE_CAPACITY, DEFAULT_SESSION_SYSTEM_PROMPT, DEFAULT_SESSION_USER_PROMPT,
    InboundFrame, Session, SessionConfig, SessionHandle, SessionPhase, SessionServices,
};
pub use output::{ClientSink, OutputEvent, OutputMultiplexer, OutputSenders};
pub use params::SharedParams;
pub use transcript::{TranscriptAggregator, TranscriptFragment};
pub use trigger::{
    DEFAULT_POLL_INTERVAL, DEFAULT_SILENCE_TIMEOUT, TriggerCommand, TriggerPolicy, TriggerState,
};
pub use workers::DialogueCommand;
