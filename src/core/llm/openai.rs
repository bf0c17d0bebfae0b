//! OpenAI-compatible chat-completions transport.
//!
//! Works against any endpoint implementing `POST {base_url}/chat/completions`
//! with function-style tools (OpenAI, Doubao/Ark, vLLM, ...).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::{LlmError, LlmResult, ModelTransport, ToolDefinition};
use crate::core::dialogue::{Message, Role, ToolCall};

/// Ark endpoint used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Chat-completions client
pub struct OpenAIChatTransport {
    client: Client,
    config: OpenAIChatConfig,
}

impl OpenAIChatTransport {
    pub fn new(config: OpenAIChatConfig) -> LlmResult<Self> {
        if config.model.is_empty() {
            return Err(LlmError::InvalidConfiguration(
                "model name is required".to_string(),
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

fn function_type() -> String {
    "function".to_string()
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = message.has_tool_calls().then(|| {
            message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    kind: function_type(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect()
        });

        Self {
            role: message.role.as_str().to_string(),
            content: Some(message.content.clone()),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
            name: message.name.clone(),
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let tool_calls: Vec<ToolCall> = wire
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
            .collect();
        let content = wire.content.unwrap_or_default();

        if tool_calls.is_empty() {
            Message::assistant(content)
        } else {
            Message::assistant_with_tool_calls(content, tool_calls)
        }
    }
}

#[async_trait]
impl ModelTransport for OpenAIChatTransport {
    async fn complete(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
    ) -> LlmResult<Message> {
        for message in conversation {
            debug!(role = message.role.as_str(), "context: {}", message.content);
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: conversation.iter().map(WireMessage::from).collect(),
            tools: tools
                .iter()
                .map(|function| WireTool {
                    kind: "function",
                    function,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::DecodeFailed(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        if choice.message.role != Role::Assistant.as_str() {
            debug!("Unexpected response role: {}", choice.message.role);
        }

        let message = Message::from(choice.message);
        if message.has_tool_calls() {
            let names: Vec<&str> = message.tool_calls.iter().map(|c| c.name.as_str()).collect();
            info!("Model requested tools: [{}]", names.join(", "));
        }

        Ok(message)
    }

    fn provider_info(&self) -> &'static str {
        "OpenAI-compatible chat completions"
    }
}
