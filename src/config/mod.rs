//! Configuration module for the Parley Gateway server
//!
//! Configuration comes from environment variables, with `.env` files loaded
//! by the binary before [`ServerConfig::from_env`] runs. Every provider
//! credential is optional at startup; components that need a missing
//! credential fail at the point of use with a descriptive error.
//!
//! # Example
//! ```rust,no_run
//! use parley_gateway::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;

use thiserror::Error;

/// Default bind host when `HOST` is not set.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port when `PORT` is not set.
const DEFAULT_PORT: u16 = 8080;

/// Default Groq chat model for response generation.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was present but unparseable
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Server configuration
///
/// Contains all configuration needed to run the Parley Gateway, including:
/// - Server settings (host, port, CORS)
/// - Generation backend settings (Groq API key and model)
/// - Telephony control-plane settings (Twilio credentials)
/// - Call-transfer defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    /// Groq API key for the generation backend
    pub groq_api_key: Option<String>,
    /// Groq chat model used for turn responses
    pub groq_model: String,

    // Twilio control-plane credentials
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    /// Messaging service used for out-of-band SMS delivery
    pub twilio_messaging_service_sid: Option<String>,

    /// Fallback destination when a transfer request carries no number
    pub default_transfer_destination: Option<String>,

    /// Comma-separated CORS origins, or "*" for any
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing optional values stay `None`; only malformed values (e.g. a
    /// non-numeric `PORT`) are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT".to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            groq_api_key: read_optional("GROQ_API_KEY"),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            twilio_account_sid: read_optional("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: read_optional("TWILIO_AUTH_TOKEN"),
            twilio_messaging_service_sid: read_optional("TWILIO_MESSAGING_SERVICE_SID"),
            default_transfer_destination: read_optional("DEFAULT_TRANSFER_DESTINATION"),
            cors_allowed_origins: read_optional("CORS_ALLOWED_ORIGINS"),
        })
    }

    /// The socket address string this server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            groq_api_key: None,
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_messaging_service_sid: None,
            default_transfer_destination: None,
            cors_allowed_origins: None,
        }
    }
}

/// Read an environment variable, treating empty strings as unset.
fn read_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
