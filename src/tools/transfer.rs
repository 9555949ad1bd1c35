//! Call transfer tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

use crate::core::llm::ToolDefinition;
use crate::telephony::TwilioClient;

use super::{CallContext, ToolError, ToolHandler, ToolOutcome, ToolResult, parse_arguments};

/// Redirects the live call to a human destination.
///
/// The destination comes from the backend's `transfer_to` argument, falling
/// back to the configured default. The redirect runs in a spawned task so
/// the caller hears the narration while the telephony side catches up.
pub struct TransferCallTool {
    telephony: Arc<TwilioClient>,
    default_destination: Option<String>,
}

impl TransferCallTool {
    pub fn new(telephony: Arc<TwilioClient>, default_destination: Option<String>) -> Self {
        Self {
            telephony,
            default_destination,
        }
    }
}

#[async_trait]
impl ToolHandler for TransferCallTool {
    fn name(&self) -> &'static str {
        "transfer_call"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "transfer_call".to_string(),
            description: "Transfer the call to a human agent when the caller asks to speak \
                          with a person or needs help you cannot provide."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "transfer_to": {
                        "type": "string",
                        "description": "Phone number to transfer the call to, in E.164 format"
                    }
                },
                "required": []
            }),
        }
    }

    fn narration(&self) -> &'static str {
        "One moment please, I will transfer your call now."
    }

    async fn invoke(&self, context: &CallContext, arguments: &str) -> ToolResult<ToolOutcome> {
        let parsed = parse_arguments(arguments)?;
        let destination = parsed
            .get("transfer_to")
            .and_then(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.default_destination.clone())
            .ok_or_else(|| ToolError::MissingArgument("transfer_to".to_string()))?;

        let call_sid = context.provider_call_sid.clone().unwrap_or_default();
        let call_id = context.call_id.clone();
        info!(call_id, destination, "Transfer requested");

        let telephony = self.telephony.clone();
        tokio::spawn(async move {
            if let Err(e) = telephony.transfer_call(&call_sid, &destination).await {
                error!(call_id, error = %e, "Call transfer failed");
            }
        });

        Ok(ToolOutcome { end_call: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_telephony() -> Arc<TwilioClient> {
        Arc::new(
            TwilioClient::new(None, None, None, "http://127.0.0.1:0".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_missing_destination_without_default() {
        let tool = TransferCallTool::new(stub_telephony(), None);
        let result = tool.invoke(&CallContext::default(), "{}").await;
        assert!(matches!(result, Err(ToolError::MissingArgument(_))));
    }

    #[tokio::test]
    async fn test_default_destination_accepted() {
        let tool = TransferCallTool::new(stub_telephony(), Some("+15550100".to_string()));
        let outcome = tool.invoke(&CallContext::default(), "").await.unwrap();
        assert!(!outcome.end_call);
    }

    #[tokio::test]
    async fn test_argument_destination_accepted() {
        let tool = TransferCallTool::new(stub_telephony(), None);
        let outcome = tool
            .invoke(&CallContext::default(), r#"{"transfer_to":"+15550123"}"#)
            .await
            .unwrap();
        assert!(!outcome.end_call);
    }

    #[tokio::test]
    async fn test_malformed_arguments_rejected() {
        let tool = TransferCallTool::new(stub_telephony(), Some("+15550100".to_string()));
        let result = tool.invoke(&CallContext::default(), "{oops").await;
        assert!(matches!(result, Err(ToolError::MalformedArguments(_))));
    }
}
