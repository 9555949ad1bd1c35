//! Groq backend configuration.

use crate::config::DEFAULT_GROQ_MODEL;

/// Groq OpenAI-compatible chat completions endpoint.
pub const GROQ_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default sampling temperature for spoken replies.
const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Default completion budget. Spoken turns are short; this bounds runaway
/// generations, not normal replies.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default nucleus sampling parameter.
const DEFAULT_TOP_P: f32 = 1.0;

/// Configuration for the Groq chat-completions client.
#[derive(Debug, Clone)]
pub struct GroqLlmConfig {
    /// API key (`gsk_...`)
    pub api_key: String,
    /// Chat model, e.g. `llama-3.1-8b-instant`
    pub model: String,
    /// Sampling temperature (0.0 to 2.0)
    pub temperature: f32,
    /// Maximum completion tokens per turn
    pub max_tokens: u32,
    /// Nucleus sampling parameter
    pub top_p: f32,
    /// Endpoint URL, overridable for tests
    pub api_url: String,
}

impl GroqLlmConfig {
    /// Create a configuration with default generation parameters.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key is required for the Groq backend".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("Model name must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for GroqLlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
            api_url: GROQ_CHAT_COMPLETIONS_URL.to_string(),
        }
    }
}
