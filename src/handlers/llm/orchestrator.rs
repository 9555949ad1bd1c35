//! Turn orchestration.
//!
//! [`run_turn`] drives one admitted turn from prompt to terminal frame: it
//! submits the prompt to the generation backend, forwards text deltas as
//! partial frames, intercepts tool signals, and always closes the response
//! window with exactly one terminal frame, whatever happened in between.
//! Backend failures and supersession change what the window contains, never
//! whether it is closed.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, warn};

use crate::core::llm::{BaseLlm, GenerationDelta};
use crate::core::prompt::build_turn_prompt;
use crate::tools::ToolRegistry;

use super::messages::OutboundFrame;
use super::session::{Session, TurnRequest};

/// How a turn's generation stream ended.
#[derive(Debug, PartialEq, Eq)]
enum TurnOutcome {
    /// The stream ran to completion for a live turn
    Completed { end_call: bool },
    /// A newer turn (or session close) took the window mid-stream
    Superseded,
}

/// Run one turn to completion.
///
/// The terminal frame is emitted unconditionally at the end, even when the
/// backend fails before producing anything or the turn is superseded
/// mid-stream. A superseded turn's terminal frame is harmless: the platform
/// keys frames by `response_id` and has already moved on.
pub async fn run_turn(
    session: Arc<Session>,
    llm: Arc<dyn BaseLlm>,
    tools: Arc<ToolRegistry>,
    turn: TurnRequest,
) {
    let response_id = turn.response_id;

    let end_call = match stream_turn(&session, llm.as_ref(), &tools, &turn).await {
        Ok(TurnOutcome::Completed { end_call }) => end_call,
        Ok(TurnOutcome::Superseded) => false,
        Err(e) => {
            error!(
                call_id = %session.call_id(),
                response_id,
                error = %e,
                "Turn generation failed"
            );
            false
        }
    };

    let _ = session
        .send(OutboundFrame::terminal(response_id, end_call))
        .await;
}

/// Drive the generation stream for one turn, without the terminal frame.
///
/// Dropping the stream on early return aborts the backend request.
async fn stream_turn(
    session: &Session,
    llm: &dyn BaseLlm,
    tools: &ToolRegistry,
    turn: &TurnRequest,
) -> Result<TurnOutcome, crate::core::llm::LlmError> {
    let prompt = build_turn_prompt(turn.kind, &turn.transcript);
    let catalog = tools.catalog();
    let mut stream = llm.submit(prompt, &catalog).await?;

    let mut end_call = false;
    while let Some(delta) = stream.next().await {
        // Staleness is checked per delta so a superseded turn stops paying
        // for backend output it will never forward.
        if !turn.is_live(session) {
            return Ok(TurnOutcome::Superseded);
        }

        match delta? {
            GenerationDelta::Text(text) => {
                if session
                    .send(OutboundFrame::partial(turn.response_id, text))
                    .await
                    .is_err()
                {
                    return Ok(TurnOutcome::Superseded);
                }
            }
            GenerationDelta::ToolSignal { name, arguments } => {
                let Some(handler) = tools.get(&name) else {
                    warn!(
                        call_id = %session.call_id(),
                        tool = %name,
                        "Backend signalled unknown tool"
                    );
                    continue;
                };

                if session
                    .send(OutboundFrame::partial(turn.response_id, handler.narration()))
                    .await
                    .is_err()
                {
                    return Ok(TurnOutcome::Superseded);
                }

                match handler.invoke(&session.call_context(), &arguments).await {
                    Ok(outcome) => end_call = outcome.end_call,
                    Err(e) => {
                        warn!(
                            call_id = %session.call_id(),
                            tool = %name,
                            error = %e,
                            "Tool invocation failed"
                        );
                    }
                }

                // A handled tool ends the spoken part of the turn; dropping
                // the stream here aborts any remaining backend output.
                break;
            }
        }
    }

    Ok(TurnOutcome::Completed { end_call })
}
