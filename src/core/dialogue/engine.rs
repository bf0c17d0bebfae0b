//! # Dialogue Engine
//!
//! Runs one conversational turn at a time against an injected
//! [`ModelTransport`] and [`ToolRegistry`]:
//!
//! ```text
//! Idle -> AwaitingCompletion -> NoToolCalls -> AppendAssistant -> Idle
//!                            \-> ToolCallsPresent -> ResolveTools
//!                                -> AwaitingSecondCompletion -> AppendFinal -> Idle
//! ```
//!
//! `run_turn` takes `&mut self`, so a single engine can never have two model
//! calls in flight. The session feeds it through a FIFO queue.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::conversation::Conversation;
use super::errors::{DialogueError, DialogueResult};
use super::message::{Message, ToolCall};
use crate::core::llm::{ModelTransport, ToolDefinition};
use crate::core::tools::ToolRegistry;

/// System prompt used when `init_conversation` receives an empty one
pub const DEFAULT_PERSONA: &str = "你是一个人工智能小助手";

#[derive(Debug, Clone, Default)]
pub struct DialogueConfig {
    /// Deadline for each model completion; `None` waits indefinitely
    pub completion_timeout: Option<Duration>,
}

pub struct DialogueEngine {
    model: Arc<dyn ModelTransport>,
    tools: Arc<ToolRegistry>,
    conversation: Conversation,
    config: DialogueConfig,
}

impl DialogueEngine {
    /// Create an engine seeded with the default persona
    pub fn new(
        model: Arc<dyn ModelTransport>,
        tools: Arc<ToolRegistry>,
        config: DialogueConfig,
    ) -> Self {
        let mut engine = Self {
            model,
            tools,
            conversation: Conversation::default(),
            config,
        };
        engine.init_conversation("", "");
        engine
    }

    /// Replace the conversation with `[system, user]`.
    ///
    /// An empty `system` becomes [`DEFAULT_PERSONA`]; an empty `user` repeats
    /// the system content.
    pub fn init_conversation(&mut self, system: &str, user: &str) {
        let system = if system.is_empty() {
            DEFAULT_PERSONA
        } else {
            system
        };
        let user = if user.is_empty() { system } else { user };

        self.conversation = Conversation::seeded(system, user);
        debug!("Conversation initialised with system prompt: {}", system);
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run one turn for `utterance` and return the assistant's final text.
    ///
    /// `Ok(None)` means the turn finished without any text to speak. A model
    /// failure aborts the turn; the user message stays in the conversation.
    pub async fn run_turn(&mut self, utterance: &str) -> DialogueResult<Option<String>> {
        if utterance.trim().is_empty() {
            debug!("Ignoring empty utterance");
            return Ok(None);
        }

        self.conversation.push(Message::user(utterance));

        let definitions = self.tools.definitions();
        let response = self.complete(&definitions).await?;

        if !response.has_tool_calls() {
            let text = response.content;
            self.conversation.push(Message::assistant(text.clone()));
            if text.is_empty() {
                warn!("Model returned an empty answer");
                return Ok(None);
            }
            return Ok(Some(text));
        }

        let mut results = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            results.push(self.resolve_call(call).await);
        }
        self.conversation.push(response);
        self.conversation.extend(results);

        let follow_up = self.complete(&[]).await?;
        let text = follow_up.content;
        if text.is_empty() {
            warn!("Model returned no text after tool resolution");
            return Ok(None);
        }

        self.conversation.push(Message::assistant(text.clone()));
        Ok(Some(text))
    }

    async fn complete(&self, tools: &[ToolDefinition]) -> DialogueResult<Message> {
        let request = self.model.complete(self.conversation.messages(), tools);
        match self.config.completion_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| DialogueError::Timeout(limit))?
                .map_err(DialogueError::from),
            None => request.await.map_err(DialogueError::from),
        }
    }

    /// Tool failures are folded into the tool message and never abort the turn
    async fn resolve_call(&self, call: &ToolCall) -> Message {
        match self.tools.resolve(&call.name, &call.arguments).await {
            Ok(result) => {
                info!(tool = %call.name, "Tool call {} resolved", call.id);
                Message::tool(call, result)
            }
            Err(e) => {
                warn!(tool = %call.name, "Tool call {} failed: {}", call.id, e);
                Message::tool(call, e.to_tool_content())
            }
        }
    }
}
