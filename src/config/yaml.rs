use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Environment
/// variables can override any values specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///
/// llm:
///   base_url: "https://ark.cn-beijing.volces.com/api/v3"
///   api_key: "your-api-key"
///   model: "your-model-endpoint"
///   timeout_seconds: 30
///
/// weather:
///   base_url: "https://api.openweathermap.org/data/2.5/weather"
///   api_key: "your-openweathermap-key"
///
/// asr:
///   url: "wss://asr.example.com/stream?signature=..."
///   chunk_bytes: 1280
///   send_interval_ms: 40
///
/// tts:
///   url: "https://tts.example.com/v1/synthesize"
///   api_key: "your-tts-key"
///   speaker: "温柔女声"
///   timeout_seconds: 10
///
/// session:
///   silence_timeout_ms: 5000
///   poll_interval_ms: 200
///   audio_queue_capacity: 100
///   system_prompt: "你是一个一个猫娘"
///   user_prompt: "请在每句话结尾加上'喵~'"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub llm: Option<LlmYaml>,
    pub weather: Option<WeatherYaml>,
    pub asr: Option<AsrYaml>,
    pub tts: Option<TtsYaml>,
    pub session: Option<SessionYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmYaml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WeatherYaml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AsrYaml {
    pub url: Option<String>,
    pub chunk_bytes: Option<usize>,
    pub send_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub speaker: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub silence_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub audio_queue_capacity: Option<usize>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;
        Ok(config)
    }
}
