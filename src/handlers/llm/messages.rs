//! Wire protocol for the conversational WebSocket.
//!
//! Inbound events are JSON objects dispatched on `interaction_type`;
//! outbound frames are JSON objects dispatched on `response_type`. Unknown
//! fields on inbound events are tolerated so the platform can grow its
//! payloads without breaking the gateway.

use serde::{Deserialize, Serialize};

use crate::core::transcript::Utterance;

/// Close code for an orderly end of session.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code for protocol violations (binary frames, undecodable events).
pub const CLOSE_PROTOCOL_VIOLATION: u16 = 1007;

/// Close code for internal gateway failures.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

// =============================================================================
// Inbound Events
// =============================================================================

/// One event from the platform, dispatched on `interaction_type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "interaction_type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Call metadata delivered once after connection setup
    CallDetails {
        #[serde(default)]
        call: CallInfo,
    },
    /// Liveness probe; echoed back with the same timestamp
    PingPong {
        #[serde(default)]
        timestamp: u64,
    },
    /// Transcript refresh that must not produce a response
    UpdateOnly {
        #[serde(default)]
        transcript: Option<Vec<Utterance>>,
    },
    /// The caller finished speaking; a response is owed
    ResponseRequired {
        response_id: u64,
        #[serde(default)]
        transcript: Vec<Utterance>,
    },
    /// The caller has gone quiet; a re-engagement is owed
    ReminderRequired {
        response_id: u64,
        #[serde(default)]
        transcript: Vec<Utterance>,
    },
}

/// Call metadata carried by the call-details event.
#[derive(Debug, Default, Deserialize)]
pub struct CallInfo {
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default)]
    pub metadata: Option<CallMetadata>,
}

/// Provider-side identifiers attached to the call.
#[derive(Debug, Default, Deserialize)]
pub struct CallMetadata {
    #[serde(default)]
    pub twilio_call_sid: Option<String>,
}

// =============================================================================
// Outbound Frames
// =============================================================================

/// One frame to the platform, dispatched on `response_type`.
///
/// `Deserialize` exists for tests that decode what the gateway sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Session settings, sent once immediately after the socket opens
    Config { config: ConfigPayload },
    /// A piece of agent speech for one response window
    Response {
        response_id: u64,
        content: String,
        content_complete: bool,
        end_call: bool,
    },
    /// Echo of a liveness probe
    PingPong { timestamp: u64 },
}

/// Settings block inside the config frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    /// Platform should reconnect if the socket drops
    pub auto_reconnect: bool,
    /// Platform should deliver the call-details event
    pub call_details: bool,
}

impl OutboundFrame {
    /// The config frame every session starts with.
    pub fn session_config() -> Self {
        Self::Config {
            config: ConfigPayload {
                auto_reconnect: true,
                call_details: true,
            },
        }
    }

    /// The greeting frame, bound to the reserved first response window.
    pub fn begin_message(content: impl Into<String>) -> Self {
        Self::Response {
            response_id: 0,
            content: content.into(),
            content_complete: true,
            end_call: false,
        }
    }

    /// A non-terminal speech fragment.
    pub fn partial(response_id: u64, content: impl Into<String>) -> Self {
        Self::Response {
            response_id,
            content: content.into(),
            content_complete: false,
            end_call: false,
        }
    }

    /// The terminal frame closing a response window.
    pub fn terminal(response_id: u64, end_call: bool) -> Self {
        Self::Response {
            response_id,
            content: String::new(),
            content_complete: true,
            end_call,
        }
    }
}

/// What the per-connection sender task should do next.
#[derive(Debug)]
pub enum FrameRoute {
    /// Serialize and send a frame
    Frame(OutboundFrame),
    /// Close the socket with the given code and reason, then stop
    Close { code: u16, reason: String },
}
