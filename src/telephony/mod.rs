//! Twilio control-plane client.
//!
//! Out-of-band actions on the live telephony call: redirecting an in-progress
//! call to another destination and sending SMS. These are plain REST calls
//! against the Twilio API, separate from the media and event stream the
//! WebSocket carries.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;

/// Twilio REST API base URL.
const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Request timeout for control-plane calls.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Errors from telephony control-plane operations.
#[derive(Debug, Error)]
pub enum TelephonyError {
    /// Credentials or required settings are missing
    #[error("Telephony configuration error: {0}")]
    InvalidConfiguration(String),

    /// The API request could not be delivered
    #[error("Telephony network error: {0}")]
    NetworkError(String),

    /// Twilio rejected the request
    #[error("Telephony provider error: {0}")]
    ProviderError(String),
}

pub type TelephonyResult<T> = Result<T, TelephonyError>;

/// Client for Twilio call-control and messaging endpoints.
///
/// Credentials are optional at construction; operations fail with
/// [`TelephonyError::InvalidConfiguration`] when they are missing, so a
/// gateway without Twilio credentials still serves calls that never
/// transfer or message.
pub struct TwilioClient {
    account_sid: Option<String>,
    auth_token: Option<String>,
    messaging_service_sid: Option<String>,
    api_base: String,
    http_client: Client,
}

impl TwilioClient {
    /// Build a client from server configuration.
    pub fn from_config(config: &ServerConfig) -> TelephonyResult<Self> {
        Self::new(
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_messaging_service_sid.clone(),
            TWILIO_API_BASE.to_string(),
        )
    }

    /// Build a client against an explicit API base URL.
    pub fn new(
        account_sid: Option<String>,
        auth_token: Option<String>,
        messaging_service_sid: Option<String>,
        api_base: String,
    ) -> TelephonyResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                TelephonyError::InvalidConfiguration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            account_sid,
            auth_token,
            messaging_service_sid,
            api_base,
            http_client,
        })
    }

    fn credentials(&self) -> TelephonyResult<(&str, &str)> {
        match (&self.account_sid, &self.auth_token) {
            (Some(sid), Some(token)) => Ok((sid, token)),
            _ => Err(TelephonyError::InvalidConfiguration(
                "Twilio credentials are not configured".to_string(),
            )),
        }
    }

    /// Redirect a live call to another destination.
    ///
    /// Issues a call-update with inline TwiML that dials the destination,
    /// which takes the call away from the media stream immediately.
    pub async fn transfer_call(&self, call_sid: &str, destination: &str) -> TelephonyResult<()> {
        let (account_sid, auth_token) = self.credentials()?;
        if call_sid.is_empty() {
            return Err(TelephonyError::InvalidConfiguration(
                "No provider call SID bound for this session".to_string(),
            ));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls/{}.json",
            self.api_base, account_sid, call_sid
        );
        let twiml = format!("<Response><Dial>{}</Dial></Response>", xml_escape(destination));

        let response = self
            .http_client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[("Twiml", twiml.as_str())])
            .send()
            .await
            .map_err(|e| TelephonyError::NetworkError(format!("Call update failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::ProviderError(format!(
                "Call update rejected ({status}): {body}"
            )));
        }

        info!(call_sid, destination, "Call redirected");
        Ok(())
    }

    /// Send an SMS through the configured messaging service.
    pub async fn send_sms(&self, to: &str, body: &str) -> TelephonyResult<()> {
        let (account_sid, auth_token) = self.credentials()?;
        let messaging_service_sid = self.messaging_service_sid.as_deref().ok_or_else(|| {
            TelephonyError::InvalidConfiguration(
                "TWILIO_MESSAGING_SERVICE_SID is not configured".to_string(),
            )
        })?;

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, account_sid
        );

        let response = self
            .http_client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[
                ("MessagingServiceSid", messaging_service_sid),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| TelephonyError::NetworkError(format!("SMS send failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::ProviderError(format!(
                "SMS rejected ({status}): {body}"
            )));
        }

        info!(to, "SMS sent");
        Ok(())
    }
}

/// Escape a value for embedding in TwiML text content.
fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
