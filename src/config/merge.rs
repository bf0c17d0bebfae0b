use std::env;

use super::ServerConfig;
use super::utils::parse_number;
use super::yaml::YamlConfig;
use crate::core::llm::openai::DEFAULT_BASE_URL;
use crate::core::session::{
    DEFAULT_AUDIO_QUEUE_CAPACITY, DEFAULT_POLL_INTERVAL, DEFAULT_SESSION_SYSTEM_PROMPT,
    DEFAULT_SESSION_USER_PROMPT, DEFAULT_SILENCE_TIMEOUT,
};
use crate::core::stt::streaming::{DEFAULT_CHUNK_BYTES, DEFAULT_SEND_INTERVAL};
use crate::core::tools::weather::DEFAULT_WEATHER_URL;
use crate::core::tts::DEFAULT_SPEAKER;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. Environment variables
/// 2. YAML configuration values
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration providing base values
///
/// # Returns
/// * `Result<ServerConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: ENV > YAML > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            env::var($env_var)
                .ok()
                .or($yaml_value)
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: ENV > YAML
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            env::var($env_var).ok().or($yaml_value)
        };
    }

    // Helper macro for numeric values; a malformed variable is an error
    macro_rules! get_number {
        ($env_var:expr, $yaml_value:expr) => {
            match env::var($env_var) {
                Ok(raw) => Some(parse_number($env_var, &raw)?),
                Err(_) => $yaml_value,
            }
        };
    }

    // Server configuration
    let server = yaml.server.unwrap_or_default();
    let host = get_value!("HOST", server.host, "0.0.0.0");
    let port = get_number!("PORT", server.port).unwrap_or(8080);

    // Model endpoint
    let llm = yaml.llm.unwrap_or_default();
    let llm_base_url = get_value!("LLM_BASE_URL", llm.base_url, DEFAULT_BASE_URL);
    let llm_api_key = get_optional!("LLM_API_KEY", llm.api_key);
    let llm_model = get_optional!("LLM_MODEL", llm.model);
    let llm_timeout_seconds = get_number!("LLM_TIMEOUT_SECONDS", llm.timeout_seconds);

    // Weather tools
    let weather = yaml.weather.unwrap_or_default();
    let weather_base_url = get_value!("WEATHER_BASE_URL", weather.base_url, DEFAULT_WEATHER_URL);
    let weather_api_key = get_optional!("WEATHER_API_KEY", weather.api_key);

    // Streaming recognizer
    let asr = yaml.asr.unwrap_or_default();
    let asr_url = get_optional!("ASR_URL", asr.url);
    let asr_chunk_bytes =
        get_number!("ASR_CHUNK_BYTES", asr.chunk_bytes).unwrap_or(DEFAULT_CHUNK_BYTES);
    let asr_send_interval_ms = get_number!("ASR_SEND_INTERVAL_MS", asr.send_interval_ms)
        .unwrap_or(DEFAULT_SEND_INTERVAL.as_millis() as u64);

    // Speech synthesizer
    let tts = yaml.tts.unwrap_or_default();
    let tts_url = get_optional!("TTS_URL", tts.url);
    let tts_api_key = get_optional!("TTS_API_KEY", tts.api_key);
    let tts_speaker = get_value!("TTS_SPEAKER", tts.speaker, DEFAULT_SPEAKER);
    let tts_timeout_seconds = get_number!("TTS_TIMEOUT_SECONDS", tts.timeout_seconds);

    // Session tuning
    let session = yaml.session.unwrap_or_default();
    let session_silence_timeout_ms =
        get_number!("SESSION_SILENCE_TIMEOUT_MS", session.silence_timeout_ms)
            .unwrap_or(DEFAULT_SILENCE_TIMEOUT.as_millis() as u64);
    let session_poll_interval_ms =
        get_number!("SESSION_POLL_INTERVAL_MS", session.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_millis() as u64);
    let session_audio_queue_capacity =
        get_number!("SESSION_AUDIO_QUEUE_CAPACITY", session.audio_queue_capacity)
            .unwrap_or(DEFAULT_AUDIO_QUEUE_CAPACITY);
    let default_system_prompt = get_value!(
        "DEFAULT_SYSTEM_PROMPT",
        session.system_prompt,
        DEFAULT_SESSION_SYSTEM_PROMPT
    );
    let default_user_prompt = get_value!(
        "DEFAULT_USER_PROMPT",
        session.user_prompt,
        DEFAULT_SESSION_USER_PROMPT
    );

    Ok(ServerConfig {
        host,
        port,
        llm_base_url,
        llm_api_key,
        llm_model,
        llm_timeout_seconds,
        weather_base_url,
        weather_api_key,
        asr_url,
        asr_chunk_bytes,
        asr_send_interval_ms,
        tts_url,
        tts_api_key,
        tts_speaker,
        tts_timeout_seconds,
        session_silence_timeout_ms,
        session_poll_interval_ms,
        session_audio_queue_capacity,
        default_system_prompt,
        default_user_prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{AsrYaml, LlmYaml, ServerYaml, SessionYaml};
    use serial_test::serial;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("LLM_BASE_URL");
            env::remove_var("LLM_API_KEY");
            env::remove_var("LLM_MODEL");
            env::remove_var("LLM_TIMEOUT_SECONDS");
            env::remove_var("WEATHER_BASE_URL");
            env::remove_var("WEATHER_API_KEY");
            env::remove_var("ASR_URL");
            env::remove_var("ASR_CHUNK_BYTES");
            env::remove_var("ASR_SEND_INTERVAL_MS");
            env::remove_var("TTS_URL");
            env::remove_var("TTS_API_KEY");
            env::remove_var("TTS_SPEAKER");
            env::remove_var("TTS_TIMEOUT_SECONDS");
            env::remove_var("SESSION_SILENCE_TIMEOUT_MS");
            env::remove_var("SESSION_POLL_INTERVAL_MS");
            env::remove_var("SESSION_AUDIO_QUEUE_CAPACITY");
            env::remove_var("DEFAULT_SYSTEM_PROMPT");
            env::remove_var("DEFAULT_USER_PROMPT");
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults() {
        cleanup_env_vars();

        let config = merge_config(None).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.llm_base_url, DEFAULT_BASE_URL);
        assert!(config.llm_model.is_none());
        assert!(config.llm_timeout_seconds.is_none());
        assert_eq!(config.weather_base_url, DEFAULT_WEATHER_URL);
        assert!(config.asr_url.is_none());
        assert_eq!(config.asr_chunk_bytes, 1280);
        assert_eq!(config.asr_send_interval_ms, 40);
        assert_eq!(config.tts_speaker, DEFAULT_SPEAKER);
        assert_eq!(config.session_silence_timeout_ms, 5000);
        assert_eq!(config.session_poll_interval_ms, 200);
        assert_eq!(config.session_audio_queue_capacity, 100);
        assert_eq!(config.default_system_prompt, "你是一个一个猫娘");
        assert_eq!(config.default_user_prompt, "请在每句话结尾加上'喵~'");
    }

    #[test]
    #[serial]
    fn test_merge_yaml_values() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: Some("127.0.0.1".to_string()),
                port: Some(9000),
            }),
            llm: Some(LlmYaml {
                model: Some("yaml-model".to_string()),
                timeout_seconds: Some(20),
                ..Default::default()
            }),
            asr: Some(AsrYaml {
                url: Some("wss://asr.yaml".to_string()),
                ..Default::default()
            }),
            session: Some(SessionYaml {
                user_prompt: Some("用中文回答".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.llm_model, Some("yaml-model".to_string()));
        assert_eq!(config.llm_timeout_seconds, Some(20));
        assert_eq!(config.asr_url, Some("wss://asr.yaml".to_string()));
        assert_eq!(config.default_user_prompt, "用中文回答");
        assert_eq!(config.default_system_prompt, "你是一个一个猫娘");
    }

    #[test]
    #[serial]
    fn test_merge_env_overrides_yaml() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "7000");
            env::set_var("LLM_MODEL", "env-model");
            env::set_var("SESSION_SILENCE_TIMEOUT_MS", "2500");
        }

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: Some("yaml-host".to_string()),
                port: Some(9000),
            }),
            llm: Some(LlmYaml {
                model: Some("yaml-model".to_string()),
                ..Default::default()
            }),
            session: Some(SessionYaml {
                silence_timeout_ms: Some(4000),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.host, "yaml-host");
        assert_eq!(config.port, 7000);
        assert_eq!(config.llm_model, Some("env-model".to_string()));
        assert_eq!(config.session_silence_timeout_ms, 2500);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_number() {
        cleanup_env_vars();

        unsafe {
            env::set_var("ASR_CHUNK_BYTES", "lots");
        }

        let result = merge_config(None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ASR_CHUNK_BYTES"));

        cleanup_env_vars();
    }
}
