//! Tool signal handling.
//!
//! The generation backend can end a turn with a tool call instead of (or in
//! addition to) text. Each tool is a [`ToolHandler`]: it advertises a
//! definition for the backend's tool catalog, supplies a short spoken
//! narration played while the action runs, and performs the action itself.
//! Handlers are looked up by name in a [`ToolRegistry`] owned by app state.

mod end_call;
mod take_message;
mod transfer;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::core::llm::ToolDefinition;
use crate::telephony::{TelephonyError, TwilioClient};

pub use end_call::EndCallTool;
pub use take_message::TakeMessageTool;
pub use transfer::TransferCallTool;

/// Errors from tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments payload was not valid JSON
    #[error("Malformed tool arguments: {0}")]
    MalformedArguments(String),

    /// A required argument was absent and no fallback is configured
    #[error("Missing tool argument: {0}")]
    MissingArgument(String),

    /// The underlying telephony action failed
    #[error(transparent)]
    Telephony(#[from] TelephonyError),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Result of a successful tool invocation.
#[derive(Debug, Default)]
pub struct ToolOutcome {
    /// When true, the terminal frame for this turn asks the platform to
    /// hang up after speech finishes.
    pub end_call: bool,
}

/// Per-call facts a tool may need.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Gateway-side call identifier, for logging
    pub call_id: String,
    /// Provider call SID, bound from call details
    pub provider_call_sid: Option<String>,
    /// Caller's phone number, bound from call details
    pub caller_number: Option<String>,
}

/// A named action the generation backend can request mid-turn.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool name as the backend emits it.
    fn name(&self) -> &'static str;

    /// Definition advertised in the backend's tool catalog.
    fn definition(&self) -> ToolDefinition;

    /// Short sentence spoken while the action runs.
    fn narration(&self) -> &'static str;

    /// Perform the action. Long-running side effects should be spawned so
    /// the turn's terminal frame is not delayed behind them.
    async fn invoke(&self, context: &CallContext, arguments: &str) -> ToolResult<ToolOutcome>;
}

/// Name-keyed collection of tool handlers.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<&'static str, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in tool set wired to the given telephony
    /// client and configuration.
    pub fn builtin(telephony: Arc<TwilioClient>, config: &ServerConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TransferCallTool::new(
            telephony.clone(),
            config.default_transfer_destination.clone(),
        )));
        registry.register(Arc::new(TakeMessageTool::new(telephony)));
        registry.register(Arc::new(EndCallTool));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Definitions for every registered tool, for the backend request.
    pub fn catalog(&self) -> Vec<ToolDefinition> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Decode a tool-arguments payload, tolerating the empty string the backend
/// sends for argument-free calls.
pub(crate) fn parse_arguments(arguments: &str) -> ToolResult<serde_json::Value> {
    if arguments.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_str(arguments).map_err(|e| ToolError::MalformedArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_contents() {
        let telephony = Arc::new(
            TwilioClient::from_config(&ServerConfig::default()).unwrap(),
        );
        let registry = ToolRegistry::builtin(telephony, &ServerConfig::default());

        assert!(registry.get("transfer_call").is_some());
        assert!(registry.get("take_message").is_some());
        assert!(registry.get("end_call").is_some());
        assert!(registry.get("launch_missiles").is_none());
        assert_eq!(registry.catalog().len(), 3);
    }

    #[test]
    fn test_parse_arguments_accepts_empty() {
        assert!(parse_arguments("").unwrap().is_object());
        assert!(parse_arguments("  ").unwrap().is_object());
    }

    #[test]
    fn test_parse_arguments_rejects_garbage() {
        assert!(matches!(
            parse_arguments("{truncated"),
            Err(ToolError::MalformedArguments(_))
        ));
    }
}
