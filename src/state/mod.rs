use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

use crate::config::ServerConfig;
use crate::core::llm::{ModelTransport, OpenAIChatTransport};
use crate::core::session::{SessionConfig, SessionServices};
use crate::core::stt::StreamingRecognizer;
use crate::core::tools::ToolRegistry;
use crate::core::tts::HttpSynthesizer;

/// Application state that can be shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Tuning every new session starts from
    pub session_config: SessionConfig,
    /// Transport clients injected into every session
    pub services: SessionServices,
    active_sessions: AtomicUsize,
}

impl AppState {
    /// Build the transport clients from `config`
    ///
    /// Fails when a required endpoint (model, recognizer, synthesizer) is not
    /// configured or a client cannot be constructed.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let model = OpenAIChatTransport::new(config.llm_config()?)?;
        let recognizer = StreamingRecognizer::new(config.recognizer_config()?)?;
        let synthesizer = HttpSynthesizer::new(config.synthesizer_config()?)?;
        let tools = ToolRegistry::with_weather(config.weather_config())?;

        info!(
            "Session services ready: model={}, tools={}",
            model.provider_info(),
            tools.len()
        );

        let services = SessionServices {
            recognizer: Arc::new(recognizer),
            synthesizer: Arc::new(synthesizer),
            model: Arc::new(model),
            tools: Arc::new(tools),
        };
        Ok(Self::with_services(config, services))
    }

    /// Use already constructed transports
    pub fn with_services(config: ServerConfig, services: SessionServices) -> Arc<Self> {
        let session_config = config.session_config();
        Arc::new(Self {
            config,
            session_config,
            services,
            active_sessions: AtomicUsize::new(0),
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Count a session as active until the returned guard is dropped
    pub fn track_session(self: &Arc<Self>) -> ActiveSessionGuard {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        ActiveSessionGuard {
            state: Arc::clone(self),
        }
    }
}

pub struct ActiveSessionGuard {
    state: Arc<AppState>,
}

impl Drop for ActiveSessionGuard {
    fn drop(&mut self) {
        self.state.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }
}
