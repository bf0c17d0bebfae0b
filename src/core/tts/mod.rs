mod base;
pub mod http;

// Re-export public types and traits
pub use base::{
    DEFAULT_SPEED, DEFAULT_VOLUME, SPEED_RANGE, SynthesisParams, SynthesisTransport, TTSError,
    TTSResult, VOLUME_RANGE,
};

// Re-export the HTTP synthesizer
pub use http::{DEFAULT_SPEAKER, HttpSynthesizer, HttpSynthesizerConfig, voice_type};
