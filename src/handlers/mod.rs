//! HTTP and WebSocket request handlers.

pub mod api;
pub mod llm;
