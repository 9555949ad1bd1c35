//! WebSocket connection handling for the conversational endpoint.
//!
//! One connection is one call. The socket is split in two: a receive loop
//! on this task decodes and dispatches platform events, while a dedicated
//! sender task owns the write half and drains the session's frame channel.
//! Funnelling every frame through that single channel is what keeps
//! concurrent turn tasks from interleaving writes.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::llm::BaseLlm;
use crate::core::prompt::BEGIN_SENTENCE;
use crate::core::transcript::{Role, TurnKind};
use crate::state::AppState;

use super::messages::{
    CLOSE_INTERNAL_ERROR, CLOSE_NORMAL, CLOSE_PROTOCOL_VIOLATION, FrameRoute, InboundEvent,
    OutboundFrame,
};
use super::orchestrator::run_turn;
use super::session::{Session, TurnRequest};

/// Outbound frame channel capacity. Turns produce frames faster than the
/// socket drains them only briefly; this absorbs those bursts.
const OUTBOUND_BUFFER: usize = 64;

/// Upgrade handler for `GET /llm-websocket/{call_id}`.
pub async fn llm_websocket_handler(
    ws: WebSocketUpgrade,
    Path(call_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!(call_id, "Conversational WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_llm_socket(socket, call_id, state))
}

/// Run one call's connection to completion.
async fn handle_llm_socket(socket: WebSocket, call_id: String, state: Arc<AppState>) {
    info!(call_id, "Call connected");

    let (ws_sender, mut ws_receiver) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<FrameRoute>(OUTBOUND_BUFFER);
    let sender_task = tokio::spawn(run_sender(ws_sender, outbound_rx));

    let session = Session::open(call_id.clone(), outbound_tx);

    // Config first, before any event arrives, so the platform knows to
    // deliver call details and to reconnect on drops.
    if session.send(OutboundFrame::session_config()).await.is_err() {
        warn!(call_id, "Connection lost before config frame");
        return;
    }

    // One backend client per call.
    let llm: Arc<dyn BaseLlm> = match state.llm_factory.create() {
        Ok(client) => Arc::from(client),
        Err(e) => {
            error!(call_id, error = %e, "Generation backend unavailable");
            session
                .close_transport(CLOSE_INTERNAL_ERROR, "Generation backend unavailable")
                .await;
            let _ = sender_task.await;
            return;
        }
    };

    while let Some(message) = ws_receiver.next().await {
        match message {
            Ok(message) => {
                if !dispatch_message(&session, &state, &llm, message).await {
                    break;
                }
            }
            Err(e) => {
                warn!(call_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    session.close();
    session.close_transport(CLOSE_NORMAL, "Session ended").await;
    let _ = sender_task.await;
    info!(call_id, "Call disconnected");
}

/// Drain the frame channel into the socket. Stops at the first close
/// route, send failure, or channel shutdown.
async fn run_sender(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<FrameRoute>,
) {
    while let Some(route) = outbound_rx.recv().await {
        match route {
            FrameRoute::Frame(frame) => {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(error = %e, "Failed to serialize outbound frame");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            FrameRoute::Close { code, reason } => {
                let _ = ws_sender
                    .send(Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })))
                    .await;
                break;
            }
        }
    }
}

/// Handle one WebSocket message. Returns false when the receive loop
/// should stop.
async fn dispatch_message(
    session: &Arc<Session>,
    state: &Arc<AppState>,
    llm: &Arc<dyn BaseLlm>,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => match serde_json::from_str::<InboundEvent>(text.as_str()) {
            Ok(event) => {
                dispatch_event(session, state, llm, event).await;
                true
            }
            Err(e) => {
                warn!(call_id = %session.call_id(), error = %e, "Undecodable event");
                session
                    .close_transport(CLOSE_PROTOCOL_VIOLATION, "Undecodable event payload")
                    .await;
                false
            }
        },
        Message::Binary(_) => {
            warn!(call_id = %session.call_id(), "Binary frame on text protocol");
            session
                .close_transport(CLOSE_PROTOCOL_VIOLATION, "Binary frames are not supported")
                .await;
            false
        }
        // Axum answers pings itself; both directions are ignorable here.
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            debug!(call_id = %session.call_id(), "Client closed connection");
            false
        }
    }
}

/// Handle one decoded platform event.
async fn dispatch_event(
    session: &Arc<Session>,
    state: &Arc<AppState>,
    llm: &Arc<dyn BaseLlm>,
    event: InboundEvent,
) {
    match event {
        InboundEvent::CallDetails { call } => {
            if let Some(metadata) = call.metadata
                && let Some(sid) = metadata.twilio_call_sid
            {
                session.bind_provider_call(sid);
            }
            if let Some(from) = call.from_number {
                session.bind_caller_number(from);
            }
            info!(call_id = %session.call_id(), "Call details received");

            // The greeting occupies the reserved first response window and
            // joins the transcript so later turns see it.
            session.record_utterance(Role::Agent, BEGIN_SENTENCE);
            let _ = session.send(OutboundFrame::begin_message(BEGIN_SENTENCE)).await;
        }
        InboundEvent::PingPong { timestamp } => {
            let _ = session.send(OutboundFrame::PingPong { timestamp }).await;
        }
        InboundEvent::UpdateOnly { transcript } => {
            if let Some(transcript) = transcript {
                session.replace_transcript(transcript);
            }
        }
        InboundEvent::ResponseRequired {
            response_id,
            transcript,
        } => {
            let turn = TurnRequest::admit(session, response_id, TurnKind::Response, transcript);
            tokio::spawn(run_turn(
                session.clone(),
                llm.clone(),
                state.tools.clone(),
                turn,
            ));
        }
        InboundEvent::ReminderRequired {
            response_id,
            transcript,
        } => {
            let turn = TurnRequest::admit(session, response_id, TurnKind::Reminder, transcript);
            tokio::spawn(run_turn(
                session.clone(),
                llm.clone(),
                state.tools.clone(),
                turn,
            ));
        }
    }
}
