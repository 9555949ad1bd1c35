//! Base traits and types for streaming generation backends.
//!
//! A generation backend accepts an ordered list of role-tagged chat messages
//! plus an optional tool catalog, and answers with a lazy stream of
//! [`GenerationDelta`] items. The stream is finite once the backend signals
//! completion and is not restartable; retrying requires a fresh
//! [`BaseLlm::submit`] call. Abandoning a stream is done by dropping it,
//! which aborts the underlying request.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while talking to a generation backend.
///
/// The orchestrator treats every variant identically (log, close the turn);
/// the distinctions exist for diagnostics.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transport-level failure reaching the backend
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Backend returned an error response
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Backend payload could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type for generation backend operations.
pub type LlmResult<T> = Result<T, LlmError>;

// =============================================================================
// Prompt Types
// =============================================================================

/// Chat message role understood by the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A tool the backend may signal mid-stream.
///
/// `parameters` is a JSON schema object describing the tool's arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// =============================================================================
// Generation Stream
// =============================================================================

/// One incremental unit of generation output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationDelta {
    /// A fragment of spoken-response text
    Text(String),
    /// A fully assembled tool invocation signal
    ToolSignal {
        name: String,
        /// Raw JSON arguments as produced by the backend
        arguments: String,
    },
}

/// Lazy, finite, non-restartable sequence of generation deltas.
///
/// Ends with `None` on normal completion, yields an `Err` item on backend
/// failure, and aborts the in-flight backend request when dropped.
pub type GenerationStream = Pin<Box<dyn Stream<Item = LlmResult<GenerationDelta>> + Send>>;

// =============================================================================
// Backend Trait
// =============================================================================

/// Abstraction over an incremental generation backend.
#[async_trait]
pub trait BaseLlm: Send + Sync {
    /// Submit a prompt and obtain the delta stream for one generation.
    ///
    /// Each call starts an independent backend request; a failed or
    /// abandoned stream is retried only by submitting again.
    async fn submit(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> LlmResult<GenerationStream>;

    /// Human-readable backend identifier for logs.
    fn provider_info(&self) -> &'static str;
}

/// Factory for per-session backend clients.
///
/// Mirrors how providers are created dynamically elsewhere: the dispatcher
/// asks the factory for a client when a call connects, which keeps the
/// concrete backend swappable (and scriptable in tests).
pub trait LlmFactory: Send + Sync {
    fn create(&self) -> LlmResult<Box<dyn BaseLlm>>;
}
