//! # Tool Registry
//!
//! Callable functions the model may request during a turn. The registry owns
//! argument handling: the raw JSON payload the model produced is parsed,
//! checked against the tool's declared `required` list, and only then handed
//! to the tool itself.

pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::llm::ToolDefinition;

pub use weather::{CityWeatherTool, CoordinatesWeatherTool, WeatherClient, WeatherConfig};

/// Reasons a tool call could not produce a result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("empty arguments for {0}")]
    EmptyArguments(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("missing required argument: {0}")]
    MissingArgument(String),

    #[error("execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    /// Text placed into the tool-role message answering a failed call
    pub fn to_tool_content(&self) -> String {
        format!("error: {self}")
    }
}

/// Result type for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

/// A function the model can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declaration sent to the model
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with already-validated arguments
    async fn invoke(&self, arguments: &Value) -> ToolResult<String>;
}

/// Name-indexed set of tools, shared by every session
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, kept so definitions are offered deterministically
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with both weather tools backed by one client
    pub fn with_weather(config: WeatherConfig) -> ToolResult<Self> {
        let client = Arc::new(WeatherClient::new(config)?);
        let mut registry = Self::new();
        registry.register(Arc::new(CoordinatesWeatherTool::new(client.clone())));
        registry.register(Arc::new(CityWeatherTool::new(client)));
        Ok(registry)
    }

    /// Add a tool, replacing any previous tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Parse `arguments`, validate required fields and invoke `name`.
    pub async fn resolve(&self, name: &str, arguments: &str) -> ToolResult<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        if arguments.trim().is_empty() {
            return Err(ToolError::EmptyArguments(name.to_string()));
        }

        let parsed: Value = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if !parsed.is_object() {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".to_string(),
            ));
        }

        let definition = tool.definition();
        for required in definition.required_arguments() {
            if !has_value(&parsed, required) {
                warn!(tool = name, "Missing required argument: {}", required);
                return Err(ToolError::MissingArgument(required.to_string()));
            }
        }

        debug!(tool = name, "Invoking tool with {}", arguments);
        tool.invoke(&parsed).await
    }
}

/// Present, non-null and, for strings, non-empty
fn has_value(arguments: &Value, key: &str) -> bool {
    match arguments.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
