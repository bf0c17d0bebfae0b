//! # Synthesis Transport Base Trait
//!
//! Turns one piece of assistant text into one opaque audio blob. Volume and
//! speed travel with every request as a [`SynthesisParams`] snapshot.

use async_trait::async_trait;
use bytes::Bytes;

/// Error types for synthesis transports
#[derive(Debug, thiserror::Error)]
pub enum TTSError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Synthesis API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Audio decode failed: {0}")]
    DecodeFailed(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for synthesis operations
pub type TTSResult<T> = Result<T, TTSError>;

pub const VOLUME_RANGE: (f64, f64) = (-10.0, 10.0);
pub const SPEED_RANGE: (f64, f64) = (-2.0, 6.0);
pub const DEFAULT_VOLUME: f64 = 5.0;
pub const DEFAULT_SPEED: f64 = 0.0;

/// Volume and speed applied to a synthesis request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    /// Within [-10, 10]
    pub volume: f64,
    /// Within [-2, 6]
    pub speed: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            speed: DEFAULT_SPEED,
        }
    }
}

impl SynthesisParams {
    /// Step volume by one unit, saturating at the range bounds
    pub fn adjust_volume(&mut self, louder: bool) -> f64 {
        let step = if louder { 1.0 } else { -1.0 };
        self.volume = (self.volume + step).clamp(VOLUME_RANGE.0, VOLUME_RANGE.1);
        self.volume
    }

    /// Step speed by one unit, saturating at the range bounds
    pub fn adjust_speed(&mut self, faster: bool) -> f64 {
        let step = if faster { 1.0 } else { -1.0 };
        self.speed = (self.speed + step).clamp(SPEED_RANGE.0, SPEED_RANGE.1);
        self.speed
    }
}

/// Base trait for speech synthesizers
#[async_trait]
pub trait SynthesisTransport: Send + Sync {
    /// Synthesize `text` with the given speaker profile name and parameters
    async fn synthesize(
        &self,
        text: &str,
        speaker: &str,
        params: SynthesisParams,
    ) -> TTSResult<Bytes>;

    /// Provider description used in logs
    fn provider_info(&self) -> &'static str;
}
