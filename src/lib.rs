//! Parley Gateway
//!
//! A WebSocket gateway that bridges a telephony platform's conversational
//! event stream to a streaming generation backend, so a voice agent can
//! answer callers turn by turn. The platform handles audio and transcription;
//! this service handles what the agent says next.

pub mod config;
pub mod core;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod telephony;
pub mod tools;

// Re-export commonly used items for convenience
pub use crate::config::ServerConfig;
pub use crate::core::llm::{BaseLlm, GenerationDelta, LlmError, LlmFactory};
pub use crate::state::AppState;
