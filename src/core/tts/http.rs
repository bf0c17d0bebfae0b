//! Request/response speech synthesizer over HTTP.
//!
//! One `POST` per text; the service answers with base64-encoded audio.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::{SynthesisParams, SynthesisTransport, TTSError, TTSResult};

/// Speaker profile used when none is configured
pub const DEFAULT_SPEAKER: &str = "温柔女声";

#[derive(Debug, Clone)]
pub struct HttpSynthesizerConfig {
    pub url: String,
    /// Sent as a bearer token when non-empty
    pub api_key: String,
    pub codec: String,
    pub timeout: Option<Duration>,
}

impl Default for HttpSynthesizerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            codec: "wav".to_string(),
            timeout: None,
        }
    }
}

/// Map a speaker profile name to the provider's voice id
pub fn voice_type(speaker: &str) -> i64 {
    match speaker {
        "标准女声" => 1001,
        "标准男声" => 1002,
        _ => 1003,
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_type: i64,
    speed: f64,
    volume: f64,
    codec: &'a str,
    model_type: i64,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    #[serde(alias = "Audio", alias = "audioContent")]
    audio: Option<String>,
}

pub struct HttpSynthesizer {
    client: Client,
    config: HttpSynthesizerConfig,
}

impl HttpSynthesizer {
    pub fn new(config: HttpSynthesizerConfig) -> TTSResult<Self> {
        if config.url.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "synthesis URL is required".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TTSError::InvalidConfiguration(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SynthesisTransport for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        speaker: &str,
        params: SynthesisParams,
    ) -> TTSResult<Bytes> {
        let request = SynthesisRequest {
            text,
            voice_type: voice_type(speaker),
            speed: params.speed,
            volume: params.volume,
            codec: &self.config.codec,
            model_type: 1,
            session_id: uuid::Uuid::new_v4().to_string(),
        };
        debug!(
            voice_type = request.voice_type,
            "Synthesizing {} chars at volume {:.1}, speed {:.1}",
            text.chars().count(),
            params.volume,
            params.speed
        );

        let mut builder = self.client.post(&self.config.url).json(&request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TTSError::TimeoutError(e.to_string())
            } else {
                TTSError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Synthesis API returned {}", status);
            return Err(TTSError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| TTSError::DecodeFailed(e.to_string()))?;
        let encoded = parsed
            .audio
            .filter(|a| !a.is_empty())
            .ok_or_else(|| TTSError::DecodeFailed("response carried no audio".to_string()))?;

        let audio = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| TTSError::DecodeFailed(format!("invalid base64 audio: {e}")))?;
        Ok(Bytes::from(audio))
    }

    fn provider_info(&self) -> &'static str {
        "HTTP speech synthesizer"
    }
}
