//! Generation backend module.
//!
//! Defines the [`BaseLlm`] abstraction for incremental generation backends
//! and the Groq chat-completions implementation used in production. Clients
//! are created through the [`LlmFactory`] trait so the dispatcher never
//! depends on a concrete backend.

mod base;
pub mod groq;

pub use base::{
    BaseLlm, ChatMessage, ChatRole, GenerationDelta, GenerationStream, LlmError, LlmFactory,
    LlmResult, ToolDefinition,
};
pub use groq::{GroqLlm, GroqLlmConfig, GroqLlmFactory};
