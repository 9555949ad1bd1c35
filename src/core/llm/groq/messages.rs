//! Groq chat-completions wire types.
//!
//! Request and streaming-response shapes for the OpenAI-compatible
//! `chat/completions` endpoint. Streaming responses arrive as server-sent
//! events, one `data: {json}` line per chunk, terminated by `data: [DONE]`.

use serde::{Deserialize, Serialize};

use crate::core::llm::base::{ChatMessage, ToolDefinition};

// =============================================================================
// Request Types
// =============================================================================

/// Body of a streaming chat completion request.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

/// Tool entry in the request body (`{"type": "function", "function": {...}}`).
#[derive(Debug, Serialize)]
pub(crate) struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: ToolDefinition,
}

impl WireTool {
    pub fn function(definition: ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: definition,
        }
    }
}

// =============================================================================
// Streaming Response Types
// =============================================================================

/// One decoded SSE chunk.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental payload inside a chunk. Either a text fragment, a tool-call
/// fragment, or empty (role announcements, keep-alives).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Fragment of a tool call. The name arrives in the first fragment; the
/// JSON arguments accumulate across fragments.
#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallDelta {
    #[serde(default)]
    pub function: Option<ToolCallFunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallFunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct GroqErrorResponse {
    pub error: GroqErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroqErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: String,
}

// =============================================================================
// Tool Call Assembly
// =============================================================================

/// Accumulates tool-call fragments until the backend marks the call complete.
#[derive(Debug, Default)]
pub(crate) struct ToolCallAccumulator {
    name: Option<String>,
    arguments: String,
}

impl ToolCallAccumulator {
    /// Fold one chunk's tool-call fragments into the accumulator.
    pub fn absorb(&mut self, fragments: &[ToolCallDelta]) {
        for fragment in fragments {
            if let Some(function) = &fragment.function {
                if let Some(name) = &function.name {
                    self.name = Some(name.clone());
                }
                if let Some(arguments) = &function.arguments {
                    self.arguments.push_str(arguments);
                }
            }
        }
    }

    /// True once a tool name has been seen.
    pub fn is_active(&self) -> bool {
        self.name.is_some()
    }

    /// Consume the accumulator, yielding the assembled call if any.
    pub fn finish(self) -> Option<(String, String)> {
        self.name.map(|name| (name, self.arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_chunk() {
        let json = r#"{"id":"cmpl-1","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hello"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn test_decode_tool_call_chunk() {
        let json = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"transfer_call","arguments":"{\"transfer_to\""}}]},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        let calls = chunk.choices[0].delta.tool_calls.as_ref().unwrap();
        let function = calls[0].function.as_ref().unwrap();
        assert_eq!(function.name.as_deref(), Some("transfer_call"));
    }

    #[test]
    fn test_decode_empty_delta_chunk() {
        // Role announcement chunks carry neither content nor tool calls.
        let json = r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
        assert!(chunk.choices[0].delta.tool_calls.is_none());
    }

    #[test]
    fn test_decode_error_response() {
        let json = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let err: GroqErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.message, "Invalid API Key");
        assert_eq!(err.error.error_type, "invalid_request_error");
    }

    #[test]
    fn test_tool_call_accumulation_across_fragments() {
        let first: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"tool_calls":[{"function":{"name":"transfer_call","arguments":"{\"transfer_to\":"}}]}}]}"#,
        )
        .unwrap();
        let second: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"tool_calls":[{"function":{"arguments":"\"+15550100\"}"}}]}}]}"#,
        )
        .unwrap();

        let mut acc = ToolCallAccumulator::default();
        acc.absorb(first.choices[0].delta.tool_calls.as_ref().unwrap());
        acc.absorb(second.choices[0].delta.tool_calls.as_ref().unwrap());

        assert!(acc.is_active());
        let (name, arguments) = acc.finish().unwrap();
        assert_eq!(name, "transfer_call");
        assert_eq!(arguments, r#"{"transfer_to":"+15550100"}"#);
    }

    #[test]
    fn test_request_serialization_omits_empty_tools() {
        let request = ChatCompletionRequest {
            model: "llama-3.1-8b-instant".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.5,
            max_tokens: 1024,
            top_p: 1.0,
            stream: true,
            tools: None,
            tool_choice: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""stream":true"#));
        assert!(!json.contains("tools"));
    }
}
