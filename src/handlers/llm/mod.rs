//! Conversational WebSocket endpoint.
//!
//! The platform opens one WebSocket per call at `/llm-websocket/{call_id}`
//! and streams conversational events over it; the gateway answers with
//! response frames generated turn by turn. [`handler`] owns the connection
//! lifecycle, [`session`] the per-call state and supersession epoch,
//! [`orchestrator`] the generation of a single turn, and [`messages`] the
//! wire protocol.

pub mod handler;
pub mod messages;
pub mod orchestrator;
pub mod session;

pub use handler::llm_websocket_handler;
pub use messages::{FrameRoute, InboundEvent, OutboundFrame};
pub use session::{Session, TurnRequest};
