//! Hang-up tool.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::core::llm::ToolDefinition;

use super::{CallContext, ToolHandler, ToolOutcome, ToolResult};

/// Ends the call once the caller is done.
///
/// No side effect of its own; the outcome flags the turn's terminal frame
/// so the platform hangs up after the goodbye finishes playing.
pub struct EndCallTool;

#[async_trait]
impl ToolHandler for EndCallTool {
    fn name(&self) -> &'static str {
        "end_call"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "end_call".to_string(),
            description: "End the call after the caller says goodbye or the conversation \
                          has clearly concluded."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn narration(&self) -> &'static str {
        "Thank you for calling, goodbye."
    }

    async fn invoke(&self, context: &CallContext, _arguments: &str) -> ToolResult<ToolOutcome> {
        info!(call_id = context.call_id, "Hang-up requested");
        Ok(ToolOutcome { end_call: true })
    }
}
