//! Message-taking tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

use crate::core::llm::ToolDefinition;
use crate::telephony::TwilioClient;

use super::{CallContext, ToolError, ToolHandler, ToolOutcome, ToolResult, parse_arguments};

/// Records a message for an unavailable person and confirms it to the
/// caller by SMS.
///
/// The SMS goes out in a spawned task; a delivery failure is logged and
/// does not disturb the call.
pub struct TakeMessageTool {
    telephony: Arc<TwilioClient>,
}

impl TakeMessageTool {
    pub fn new(telephony: Arc<TwilioClient>) -> Self {
        Self { telephony }
    }
}

#[async_trait]
impl ToolHandler for TakeMessageTool {
    fn name(&self) -> &'static str {
        "take_message"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "take_message".to_string(),
            description: "Take a message when the person the caller wants is unavailable. \
                          Summarize who the message is for and what it says."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to record, including who it is for"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    fn narration(&self) -> &'static str {
        "Of course, I have taken your message and will pass it along. \
         You will receive a text confirmation shortly."
    }

    async fn invoke(&self, context: &CallContext, arguments: &str) -> ToolResult<ToolOutcome> {
        let parsed = parse_arguments(arguments)?;
        let message = parsed
            .get("message")
            .and_then(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ToolError::MissingArgument("message".to_string()))?
            .to_string();

        let Some(caller_number) = context.caller_number.clone() else {
            return Err(ToolError::MissingArgument(
                "caller number is not known for this call".to_string(),
            ));
        };

        let call_id = context.call_id.clone();
        info!(call_id, "Message taken");

        let telephony = self.telephony.clone();
        tokio::spawn(async move {
            let body = format!("Message received: {message}");
            if let Err(e) = telephony.send_sms(&caller_number, &body).await {
                error!(call_id, error = %e, "Message confirmation SMS failed");
            }
        });

        Ok(ToolOutcome { end_call: false })
    }
}
