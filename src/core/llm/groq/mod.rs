//! Groq chat-completions backend.
//!
//! Streams incremental response deltas from Groq's OpenAI-compatible
//! `chat/completions` endpoint (`stream: true`, server-sent events).

mod client;
mod config;
mod messages;

pub use client::{GroqLlm, GroqLlmFactory};
pub use config::{GROQ_CHAT_COMPLETIONS_URL, GroqLlmConfig};
