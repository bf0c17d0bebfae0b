//! Configuration module for the vocalis server
//!
//! This module handles server configuration from two sources: YAML files and
//! environment variables. Environment variables always override YAML values.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use vocalis::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::dialogue::DialogueConfig;
use crate::core::llm::OpenAIChatConfig;
use crate::core::session::{SessionConfig, TriggerPolicy};
use crate::core::stt::StreamingRecognizerConfig;
use crate::core::tools::WeatherConfig;
use crate::core::tts::HttpSynthesizerConfig;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Server configuration
///
/// Contains everything needed to run the server:
/// - Server settings (host, port)
/// - Model endpoint and weather tool credentials
/// - Recognizer and synthesizer endpoints
/// - Per-session tuning and default prompts
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Model endpoint
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub llm_timeout_seconds: Option<u64>,

    // Weather tools
    pub weather_base_url: String,
    pub weather_api_key: Option<String>,

    // Streaming recognizer
    pub asr_url: Option<String>,
    pub asr_chunk_bytes: usize,
    pub asr_send_interval_ms: u64,

    // Speech synthesizer
    pub tts_url: Option<String>,
    pub tts_api_key: Option<String>,
    pub tts_speaker: String,
    pub tts_timeout_seconds: Option<u64>,

    // Session tuning
    pub session_silence_timeout_ms: u64,
    pub session_poll_interval_ms: u64,
    pub session_audio_queue_capacity: usize,
    pub default_system_prompt: String,
    pub default_user_prompt: String,
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is not loaded here: the YAML file is the source of truth and
        // only real environment variables override it.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the chat-completions endpoint
    ///
    /// Fails when no model name is configured.
    pub fn llm_config(&self) -> Result<OpenAIChatConfig, String> {
        let model = self
            .llm_model
            .clone()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| "LLM_MODEL is not configured".to_string())?;
        Ok(OpenAIChatConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.llm_api_key.clone().unwrap_or_default(),
            model,
        })
    }

    pub fn weather_config(&self) -> WeatherConfig {
        WeatherConfig {
            base_url: self.weather_base_url.clone(),
            api_key: self.weather_api_key.clone().unwrap_or_default(),
        }
    }

    /// Settings for the streaming recognizer
    ///
    /// Fails when no recognizer URL is configured.
    pub fn recognizer_config(&self) -> Result<StreamingRecognizerConfig, String> {
        let url = self
            .asr_url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| "ASR_URL is not configured".to_string())?;
        Ok(StreamingRecognizerConfig {
            url,
            chunk_bytes: self.asr_chunk_bytes,
            send_interval: Duration::from_millis(self.asr_send_interval_ms),
        })
    }

    /// Settings for the HTTP synthesizer
    ///
    /// Fails when no synthesizer URL is configured.
    pub fn synthesizer_config(&self) -> Result<HttpSynthesizerConfig, String> {
        let url = self
            .tts_url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| "TTS_URL is not configured".to_string())?;
        Ok(HttpSynthesizerConfig {
            url,
            api_key: self.tts_api_key.clone().unwrap_or_default(),
            timeout: self.tts_timeout_seconds.map(Duration::from_secs),
            ..Default::default()
        })
    }

    /// Per-session tuning handed to every new session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            trigger: TriggerPolicy {
                silence_timeout: Duration::from_millis(self.session_silence_timeout_ms),
                poll_interval: Duration::from_millis(self.session_poll_interval_ms),
            },
            audio_queue_capacity: self.session_audio_queue_capacity,
            system_prompt: self.default_system_prompt.clone(),
            user_prompt: self.default_user_prompt.clone(),
            speaker: self.tts_speaker.clone(),
            dialogue: DialogueConfig {
                completion_timeout: self.llm_timeout_seconds.map(Duration::from_secs),
            },
        }
    }
}
