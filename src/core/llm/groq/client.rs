//! Groq chat-completions client implementation.
//!
//! Implements [`BaseLlm`] against Groq's OpenAI-compatible streaming API.
//! One [`submit`](BaseLlm::submit) call maps to one HTTP request with
//! `stream: true`; the response body is a server-sent event stream that is
//! decoded incrementally into [`GenerationDelta`] items. Dropping the
//! returned stream aborts the HTTP request, which is how an abandoned turn
//! cancels its backend call.
//!
//! Tool calls arrive fragmented (name first, then argument pieces); the
//! client assembles them and surfaces a single
//! [`GenerationDelta::ToolSignal`] once the backend reports
//! `finish_reason: "tool_calls"`.

use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::core::llm::base::{
    BaseLlm, ChatMessage, GenerationDelta, GenerationStream, LlmError, LlmFactory, LlmResult,
    ToolDefinition,
};

use super::config::GroqLlmConfig;
use super::messages::{
    ChatCompletionChunk, ChatCompletionRequest, GroqErrorResponse, ToolCallAccumulator, WireTool,
};

/// Total request timeout. This bounds a whole generation; turns are short
/// spoken replies, well under this.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("Parley-Gateway/", env!("CARGO_PKG_VERSION"));

/// SSE event prefix.
const SSE_DATA_PREFIX: &str = "data:";

/// SSE sentinel marking the end of the stream.
const SSE_DONE: &str = "[DONE]";

/// Groq chat-completions client implementing the [`BaseLlm`] trait.
pub struct GroqLlm {
    config: GroqLlmConfig,
    /// HTTP client for API requests (reused for connection pooling).
    http_client: Client,
}

impl GroqLlm {
    /// Create a new Groq client.
    pub fn new(config: GroqLlmConfig) -> LlmResult<Self> {
        config.validate().map_err(LlmError::InvalidConfiguration)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                LlmError::InvalidConfiguration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Classify a non-2xx response into an [`LlmError`].
    fn status_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = match serde_json::from_str::<GroqErrorResponse>(body) {
            Ok(parsed) => format!(
                "Groq API error: {} ({})",
                parsed.error.message, parsed.error.error_type
            ),
            Err(_) => format!("Groq API error ({status}): {body}"),
        };

        match status.as_u16() {
            401 | 403 => LlmError::AuthenticationFailed(message),
            429 => LlmError::ProviderError(format!("Rate limit exceeded: {message}")),
            500..=599 => LlmError::ProviderError(format!("Server error: {message}")),
            _ => LlmError::ProviderError(message),
        }
    }
}

/// Extract the payload of an SSE `data:` line, if it is one.
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix(SSE_DATA_PREFIX).map(str::trim)
}

#[async_trait]
impl BaseLlm for GroqLlm {
    async fn submit(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> LlmResult<GenerationStream> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            stream: true,
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().cloned().map(WireTool::function).collect())
            },
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
        };

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        debug!(model = %self.config.model, "Groq stream opened");

        let mut body = response.bytes_stream();
        let stream = try_stream! {
            // Raw bytes buffered until a complete SSE line is available.
            // Chunk boundaries do not align with lines or UTF-8 sequences.
            let mut buffer: Vec<u8> = Vec::new();
            let mut tool_call = ToolCallAccumulator::default();

            'body: while let Some(chunk) = body.next().await {
                let chunk = chunk
                    .map_err(|e| LlmError::NetworkError(format!("Stream read failed: {e}")))?;
                buffer.extend_from_slice(&chunk);

                while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    let line = std::str::from_utf8(&line[..newline])
                        .map_err(|e| {
                            LlmError::MalformedResponse(format!("Non-UTF-8 event data: {e}"))
                        })?
                        .trim_end_matches('\r');

                    let Some(data) = sse_data(line) else {
                        continue;
                    };
                    if data == SSE_DONE {
                        break 'body;
                    }

                    let decoded: ChatCompletionChunk =
                        serde_json::from_str(data).map_err(|e| {
                            LlmError::MalformedResponse(format!("Undecodable delta: {e}"))
                        })?;
                    let Some(choice) = decoded.choices.into_iter().next() else {
                        continue;
                    };

                    if let Some(fragments) = &choice.delta.tool_calls {
                        tool_call.absorb(fragments);
                    }
                    if let Some(text) = choice.delta.content
                        && !text.is_empty()
                    {
                        yield GenerationDelta::Text(text);
                    }
                    if choice.finish_reason.as_deref() == Some("tool_calls") {
                        break 'body;
                    }
                }
            }

            if let Some((name, arguments)) = std::mem::take(&mut tool_call).finish() {
                yield GenerationDelta::ToolSignal { name, arguments };
            }
        };

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> &'static str {
        "Groq Chat Completions"
    }
}

/// Factory producing one [`GroqLlm`] per call session.
pub struct GroqLlmFactory {
    config: GroqLlmConfig,
}

impl GroqLlmFactory {
    pub fn new(config: GroqLlmConfig) -> Self {
        Self { config }
    }

    /// Build a factory from server configuration. A missing API key is not
    /// an error here; it surfaces when a session tries to create a client.
    pub fn from_server_config(config: &ServerConfig) -> Self {
        if config.groq_api_key.is_none() {
            warn!("GROQ_API_KEY not configured; generation requests will fail");
        }
        Self {
            config: GroqLlmConfig::new(
                config.groq_api_key.clone().unwrap_or_default(),
                config.groq_model.clone(),
            ),
        }
    }
}

impl LlmFactory for GroqLlmFactory {
    fn create(&self) -> LlmResult<Box<dyn BaseLlm>> {
        Ok(Box::new(GroqLlm::new(self.config.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_requires_api_key() {
        let result = GroqLlm::new(GroqLlmConfig::default());
        assert!(matches!(result, Err(LlmError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_creation_with_valid_config() {
        let llm = GroqLlm::new(GroqLlmConfig::new("gsk_test", "llama-3.1-8b-instant")).unwrap();
        assert_eq!(llm.provider_info(), "Groq Chat Completions");
    }

    #[test]
    fn test_sse_data_extraction() {
        assert_eq!(sse_data("data: {\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(sse_data("data: [DONE]"), Some("[DONE]"));
        assert_eq!(sse_data("data:[DONE]"), Some("[DONE]"));
        assert_eq!(sse_data(""), None);
        assert_eq!(sse_data(": keep-alive comment"), None);
        assert_eq!(sse_data("event: ping"), None);
    }

    #[test]
    fn test_status_error_classification() {
        let err = GroqLlm::status_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#,
        );
        assert!(matches!(err, LlmError::AuthenticationFailed(msg) if msg.contains("Invalid API Key")));

        let err = GroqLlm::status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "busy");
        assert!(matches!(err, LlmError::ProviderError(msg) if msg.contains("Rate limit")));

        let err = GroqLlm::status_error(reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(matches!(err, LlmError::ProviderError(msg) if msg.contains("Server error")));
    }

    #[test]
    fn test_factory_from_server_config_without_key() {
        let factory = GroqLlmFactory::from_server_config(&ServerConfig::default());
        // The key is absent, so client creation must fail at session time.
        assert!(factory.create().is_err());
    }
}
