//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::llm::{GroqLlmFactory, LlmFactory};
use crate::telephony::{TelephonyError, TwilioClient};
use crate::tools::ToolRegistry;

/// State shared across all connections.
pub struct AppState {
    pub config: ServerConfig,
    /// Creates one generation client per call
    pub llm_factory: Arc<dyn LlmFactory>,
    /// Control-plane client for transfers and SMS
    pub telephony: Arc<TwilioClient>,
    /// Tools the generation backend may signal
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    /// Build production state from configuration.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, TelephonyError> {
        let llm_factory = Arc::new(GroqLlmFactory::from_server_config(&config));
        let telephony = Arc::new(TwilioClient::from_config(&config)?);
        let tools = Arc::new(ToolRegistry::builtin(telephony.clone(), &config));

        Ok(Arc::new(Self {
            config,
            llm_factory,
            telephony,
            tools,
        }))
    }

    /// State with an injected generation factory, for tests.
    pub fn with_llm_factory(
        config: ServerConfig,
        llm_factory: Arc<dyn LlmFactory>,
    ) -> Result<Arc<Self>, TelephonyError> {
        let telephony = Arc::new(TwilioClient::from_config(&config)?);
        let tools = Arc::new(ToolRegistry::builtin(telephony.clone(), &config));

        Ok(Arc::new(Self {
            config,
            llm_factory,
            telephony,
            tools,
        }))
    }
}
