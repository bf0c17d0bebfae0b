//! Stub transports shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vocalis::core::llm::{LlmResult, ModelTransport, ToolDefinition};
use vocalis::core::stt::{RecognitionTransport, STTResult};
use vocalis::core::tts::{SynthesisParams, SynthesisTransport, TTSResult};
use vocalis::{Message, ServerConfig, SessionServices, ToolRegistry, routes, state::AppState};

/// Recognizer that treats every audio frame as UTF-8 transcript text
pub struct TextRecognizer;

#[async_trait]
impl RecognitionTransport for TextRecognizer {
    async fn start_stream(
        &self,
        cancel: CancellationToken,
        mut audio: mpsc::Receiver<Bytes>,
        transcripts: mpsc::Sender<String>,
    ) -> STTResult<()> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                chunk = audio.recv() => {
                    let Some(chunk) = chunk else { return Ok(()) };
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    if transcripts.send(text).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn provider_info(&self) -> &'static str {
        "text"
    }
}

/// Model answering `回答:<last message>`
pub struct EchoModel;

#[async_trait]
impl ModelTransport for EchoModel {
    async fn complete(
        &self,
        conversation: &[Message],
        _tools: &[ToolDefinition],
    ) -> LlmResult<Message> {
        let last = conversation
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(Message::assistant(format!("回答:{last}")))
    }

    fn provider_info(&self) -> &'static str {
        "echo"
    }
}

/// Synthesizer returning `audio:<text>` as the audio payload
pub struct TextSynthesizer;

#[async_trait]
impl SynthesisTransport for TextSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _speaker: &str,
        _params: SynthesisParams,
    ) -> TTSResult<Bytes> {
        Ok(Bytes::from(format!("audio:{text}")))
    }

    fn provider_info(&self) -> &'static str {
        "text"
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        llm_base_url: "http://127.0.0.1:1".to_string(),
        llm_api_key: None,
        llm_model: Some("test-model".to_string()),
        llm_timeout_seconds: None,
        weather_base_url: "http://127.0.0.1:1".to_string(),
        weather_api_key: None,
        asr_url: None,
        asr_chunk_bytes: 1280,
        asr_send_interval_ms: 40,
        tts_url: None,
        tts_api_key: None,
        tts_speaker: "温柔女声".to_string(),
        tts_timeout_seconds: None,
        session_silence_timeout_ms: 300,
        session_poll_interval_ms: 50,
        session_audio_queue_capacity: 100,
        default_system_prompt: "你是一个一个猫娘".to_string(),
        default_user_prompt: "请在每句话结尾加上'喵~'".to_string(),
    }
}

pub fn test_state() -> Arc<AppState> {
    test_state_with(test_config())
}

pub fn test_state_with(config: ServerConfig) -> Arc<AppState> {
    let services = SessionServices {
        recognizer: Arc::new(TextRecognizer),
        synthesizer: Arc::new(TextSynthesizer),
        model: Arc::new(EchoModel),
        tools: Arc::new(ToolRegistry::new()),
    };
    AppState::with_services(config, services)
}

/// Serve the full application on an ephemeral port
pub async fn spawn_server(state: Arc<AppState>) -> std::net::SocketAddr {
    let app = routes::create_app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}
