use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::core::dialogue::{Message, Role};
use crate::core::llm::{LlmError, LlmResult, ModelTransport, ToolDefinition};
use crate::core::stt::{RecognitionTransport, STTError, STTResult};
use crate::core::tools::ToolRegistry;
use crate::core::tts::{SynthesisParams, SynthesisTransport, TTSError, TTSResult};

/// Recognizer whose transcripts are pushed by the test
struct FeedRecognizer {
    feed: Mutex<Option<mpsc::Receiver<String>>>,
    audio_chunks: Arc<AtomicUsize>,
}

#[async_trait]
impl RecognitionTransport for FeedRecognizer {
    async fn start_stream(
        &self,
        cancel: CancellationToken,
        mut audio: mpsc::Receiver<Bytes>,
        transcripts: mpsc::Sender<String>,
    ) -> STTResult<()> {
        let Some(mut feed) = self.feed.lock().take() else {
            return Ok(());
        };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                Some(_) = audio.recv() => {
                    self.audio_chunks.fetch_add(1, Ordering::SeqCst);
                }
                Some(text) = feed.recv() => {
                    if transcripts.send(text).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn provider_info(&self) -> &'static str {
        "feed"
    }
}

/// Model answering `回答:<utterance>`, failing for utterances in `failures`
#[derive(Default)]
struct EchoModel {
    requests: Mutex<Vec<Vec<Message>>>,
    failures: Mutex<HashSet<String>>,
}

impl EchoModel {
    fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ModelTransport for EchoModel {
    async fn complete(
        &self,
        conversation: &[Message],
        _tools: &[ToolDefinition],
    ) -> LlmResult<Message> {
        self.requests.lock().push(conversation.to_vec());
        let last = conversation
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if self.failures.lock().contains(&last) {
            return Err(LlmError::RequestFailed("unavailable".to_string()));
        }
        Ok(Message::assistant(format!("回答:{last}")))
    }

    fn provider_info(&self) -> &'static str {
        "echo"
    }
}

/// Synthesizer returning the text bytes and recording parameter snapshots
#[derive(Default)]
struct RecordingSynthesizer {
    requests: Mutex<Vec<(String, String, SynthesisParams)>>,
    fail: bool,
    crash: bool,
}

#[async_trait]
impl SynthesisTransport for RecordingSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        speaker: &str,
        params: SynthesisParams,
    ) -> TTSResult<Bytes> {
        self.requests
            .lock()
            .push((text.to_string(), speaker.to_string(), params));
        if self.fail {
            return Err(TTSError::RequestFailed("offline".to_string()));
        }
        if self.crash {
            panic!("synthesizer crashed");
        }
        Ok(Bytes::from(format!("audio:{text}")))
    }

    fn provider_info(&self) -> &'static str {
        "recording"
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<OutputEvent>>>,
    broken: bool,
}

#[async_trait]
impl ClientSink for RecordingSink {
    async fn send_event(&mut self, event: OutputEvent) -> SessionResult<()> {
        if self.broken {
            return Err(SessionError::Transport("connection reset".to_string()));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

struct Harness {
    feed: mpsc::Sender<String>,
    inbound: mpsc::Sender<InboundFrame>,
    model: Arc<EchoModel>,
    synthesizer: Arc<RecordingSynthesizer>,
    events: Arc<Mutex<Vec<OutputEvent>>>,
    audio_chunks: Arc<AtomicUsize>,
    handle: SessionHandle,
    task: JoinHandle<SessionResult<()>>,
}

fn inbound_stream(
    rx: mpsc::Receiver<InboundFrame>,
) -> impl Stream<Item = InboundFrame> + Send + Unpin {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    }))
}

fn start(
    config: SessionConfig,
    synthesizer: RecordingSynthesizer,
    sink: RecordingSink,
) -> Harness {
    let (feed_tx, feed_rx) = mpsc::channel(16);
    let (inbound_tx, inbound_rx) = mpsc::channel(16);
    let audio_chunks = Arc::new(AtomicUsize::new(0));
    let model = Arc::new(EchoModel::default());
    let synthesizer = Arc::new(synthesizer);

    let services = SessionServices {
        recognizer: Arc::new(FeedRecognizer {
            feed: Mutex::new(Some(feed_rx)),
            audio_chunks: audio_chunks.clone(),
        }),
        synthesizer: synthesizer.clone(),
        model: model.clone(),
        tools: Arc::new(ToolRegistry::new()),
    };

    let session = Session::new(services, config);
    let handle = session.handle();
    let events = sink.events.clone();
    let task = tokio::spawn(session.run(inbound_stream(inbound_rx), sink));

    Harness {
        feed: feed_tx,
        inbound: inbound_tx,
        model,
        synthesizer,
        events,
        audio_chunks,
        handle,
        task,
    }
}

fn default_harness() -> Harness {
    start(
        SessionConfig::default(),
        RecordingSynthesizer::default(),
        RecordingSink::default(),
    )
}

async fn settle(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

impl Harness {
    async fn say(&self, text: &str) {
        self.feed.send(text.to_string()).await.unwrap();
        settle(50).await;
    }

    async fn control(&self, json: &str) {
        self.inbound
            .send(InboundFrame::Control(json.to_string()))
            .await
            .unwrap();
        settle(50).await;
    }

    fn answers(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                OutputEvent::Answer(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn audio(&self) -> Vec<Bytes> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                OutputEvent::Audio(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn transcripts(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                OutputEvent::Transcript(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    async fn hang_up(self) -> SessionResult<()> {
        self.control(r#"{"type":"hangup"}"#).await;
        self.task.await.unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn test_silence_triggers_exactly_one_turn() {
    let harness = default_harness();

    harness.say("北京").await;
    harness.say("北京天气").await;
    assert_eq!(harness.transcripts(), vec!["北京", "北京天气"]);

    settle(4_000).await;
    assert_eq!(harness.model.calls(), 0);

    settle(2_000).await;
    assert_eq!(harness.model.calls(), 1);
    assert_eq!(harness.answers(), vec!["回答:北京天气"]);
    assert_eq!(harness.audio(), vec![Bytes::from("audio:回答:北京天气")]);

    // a second silence period with nothing buffered triggers nothing
    settle(20_000).await;
    assert_eq!(harness.model.calls(), 1);

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_new_session_is_seeded_with_configured_prompts() {
    let harness = start(
        SessionConfig {
            system_prompt: "你是客服".to_string(),
            user_prompt: "回答要简短".to_string(),
            ..Default::default()
        },
        RecordingSynthesizer::default(),
        RecordingSink::default(),
    );

    harness.say("你好").await;
    harness.control(r#"{"type":"go"}"#).await;

    let request = harness.model.requests.lock()[0].clone();
    assert_eq!(request[0], Message::system("你是客服"));
    assert_eq!(request[1], Message::user("回答要简短"));
    assert_eq!(request[2], Message::user("你好"));

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_manual_trigger() {
    let harness = default_harness();

    harness.control(r#"{"type":"go"}"#).await;
    assert_eq!(harness.model.calls(), 0);

    harness.say("讲个笑话").await;
    harness.control(r#"{"type":"go"}"#).await;
    assert_eq!(harness.model.calls(), 1);
    assert_eq!(harness.answers(), vec!["回答:讲个笑话"]);

    // the buffer was consumed; neither the timer nor another go fires again
    harness.control(r#"{"type":"go"}"#).await;
    settle(10_000).await;
    assert_eq!(harness.model.calls(), 1);

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_init_resets_conversation_and_buffer() {
    let harness = default_harness();

    harness.say("旧的问题").await;
    harness
        .control(r#"{"type":"init","system":"你是一个诗人","user":""}"#)
        .await;
    harness.control(r#"{"type":"go"}"#).await;
    settle(10_000).await;
    assert_eq!(harness.model.calls(), 0);

    harness.say("写一首诗").await;
    harness.control(r#"{"type":"go"}"#).await;

    let request = harness.model.requests.lock()[0].clone();
    assert_eq!(request.len(), 3);
    assert_eq!(request[0], Message::system("你是一个诗人"));
    // empty user falls back to the session default
    assert_eq!(request[1], Message::user(DEFAULT_SESSION_USER_PROMPT));
    assert_eq!(request[2], Message::user("写一首诗"));

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_parameter_commands_saturate() {
    let harness = default_harness();

    for _ in 0..8 {
        harness.control(r#"{"type":"up"}"#).await;
    }
    for _ in 0..5 {
        harness.control(r#"{"type":"late"}"#).await;
    }
    harness.say("测试").await;
    harness.control(r#"{"type":"go"}"#).await;

    for _ in 0..25 {
        harness.control(r#"{"type":"down"}"#).await;
    }
    for _ in 0..12 {
        harness.control(r#"{"type":"fast"}"#).await;
    }
    harness.say("再测").await;
    harness.control(r#"{"type":"go"}"#).await;

    let requests = harness.synthesizer.requests.lock().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].2,
        SynthesisParams {
            volume: 10.0,
            speed: -2.0
        }
    );
    assert_eq!(
        requests[1].2,
        SynthesisParams {
            volume: -10.0,
            speed: 6.0
        }
    );

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_and_malformed_controls_are_ignored() {
    let harness = default_harness();

    harness.control(r#"{"type":"dance"}"#).await;
    harness.control("{not json").await;
    assert_eq!(harness.handle.phase(), SessionPhase::Active);

    harness.say("还在吗").await;
    harness.control(r#"{"type":"go"}"#).await;
    assert_eq!(harness.answers(), vec!["回答:还在吗"]);

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_model_failure_keeps_session_alive() {
    let harness = default_harness();
    harness.model.failures.lock().insert("第一句".to_string());

    harness.say("第一句").await;
    harness.control(r#"{"type":"go"}"#).await;
    assert!(harness.answers().is_empty());
    assert_eq!(harness.handle.phase(), SessionPhase::Active);

    harness.say("第二句").await;
    harness.control(r#"{"type":"go"}"#).await;
    assert_eq!(harness.answers(), vec!["回答:第二句"]);

    // the failed user message stayed in the conversation
    let second = harness.model.requests.lock()[1].clone();
    let users: Vec<&str> = second
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(users[1..], ["第一句", "第二句"]);

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_synthesis_failure_still_delivers_text() {
    let harness = start(
        SessionConfig::default(),
        RecordingSynthesizer {
            fail: true,
            ..Default::default()
        },
        RecordingSink::default(),
    );

    harness.say("天气").await;
    harness.control(r#"{"type":"go"}"#).await;

    assert_eq!(harness.answers(), vec!["回答:天气"]);
    assert!(harness.audio().is_empty());
    assert_eq!(harness.synthesizer.requests.lock().len(), 1);

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_audio_frames_reach_recognizer() {
    let harness = default_harness();

    for _ in 0..5 {
        harness
            .inbound
            .send(InboundFrame::Audio(Bytes::from_static(&[0u8; 320])))
            .await
            .unwrap();
    }
    settle(50).await;
    assert_eq!(harness.audio_chunks.load(Ordering::SeqCst), 5);

    harness.hang_up().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hangup_moves_through_phases() {
    let harness = default_harness();
    let handle = harness.handle.clone();
    let mut phases = handle.subscribe_phase();
    assert_eq!(handle.phase(), SessionPhase::Active);

    harness.hang_up().await.unwrap();
    assert_eq!(handle.phase(), SessionPhase::Closed);
    assert!(phases.has_changed().unwrap_or(true));
    assert!(matches!(
        handle.send_control(ControlCommand::ManualTrigger).await,
        Err(SessionError::Closed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_client_close_ends_session() {
    let harness = default_harness();
    harness.inbound.send(InboundFrame::Close).await.unwrap();

    harness.task.await.unwrap().unwrap();
    assert_eq!(harness.handle.phase(), SessionPhase::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_handle_stop_and_remote_control() {
    let harness = default_harness();

    harness.say("远程触发").await;
    harness
        .handle
        .send_control(ControlCommand::ManualTrigger)
        .await
        .unwrap();
    settle(50).await;
    assert_eq!(harness.answers(), vec!["回答:远程触发"]);

    harness.handle.stop();
    harness.task.await.unwrap().unwrap();
    assert_eq!(harness.handle.phase(), SessionPhase::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_client_write_failure_tears_down_session() {
    let harness = start(
        SessionConfig::default(),
        RecordingSynthesizer::default(),
        RecordingSink {
            broken: true,
            ..Default::default()
        },
    );

    harness.feed.send("你好".to_string()).await.unwrap();

    let result = harness.task.await.unwrap();
    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(harness.handle.phase(), SessionPhase::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_crashed_worker_tears_down_session() {
    let harness = start(
        SessionConfig::default(),
        RecordingSynthesizer {
            crash: true,
            ..Default::default()
        },
        RecordingSink::default(),
    );
    let handle = harness.handle.clone();

    harness.say("你好").await;
    harness
        .inbound
        .send(InboundFrame::Control(r#"{"type":"go"}"#.to_string()))
        .await
        .unwrap();

    let result = harness.task.await.unwrap();
    assert!(matches!(result, Err(SessionError::Worker(_))));
    assert_eq!(handle.phase(), SessionPhase::Closed);
    assert_eq!(harness.model.calls(), 1);
}

/// Recognizer that cannot reach its service
struct UnreachableRecognizer;

#[async_trait]
impl RecognitionTransport for UnreachableRecognizer {
    async fn start_stream(
        &self,
        _cancel: CancellationToken,
        _audio: mpsc::Receiver<Bytes>,
        _transcripts: mpsc::Sender<String>,
    ) -> STTResult<()> {
        Err(STTError::ConnectionFailed("refused".to_string()))
    }

    fn provider_info(&self) -> &'static str {
        "unreachable"
    }
}

#[tokio::test(start_paused = true)]
async fn test_recognizer_failure_ends_session() {
    let services = SessionServices {
        recognizer: Arc::new(UnreachableRecognizer),
        synthesizer: Arc::new(RecordingSynthesizer::default()),
        model: Arc::new(EchoModel::default()),
        tools: Arc::new(ToolRegistry::new()),
    };
    let session = Session::new(services, SessionConfig::default());
    let handle = session.handle();
    let (_inbound_tx, inbound_rx) = mpsc::channel(1);

    let result = session
        .run(inbound_stream(inbound_rx), RecordingSink::default())
        .await;
    assert!(matches!(result, Err(SessionError::Worker(_))));
    assert_eq!(handle.phase(), SessionPhase::Closed);
}
