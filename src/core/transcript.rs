//! Conversation transcript model.
//!
//! Pure data shared between the wire protocol, prompt assembly, and the
//! per-call session: who said what, in arrival order. The signaling
//! transport resends the full transcript with every turn event, so this
//! module carries no history-merging logic.

use serde::{Deserialize, Serialize};

/// Speaker of an utterance.
///
/// Wire names follow the signaling transport: the agent side is `agent`,
/// the caller side is `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "agent")]
    Agent,
    #[serde(rename = "user")]
    Caller,
}

/// One utterance in the conversation, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub role: Role,
    pub content: String,
}

impl Utterance {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// What triggered a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// The caller finished speaking and a reply is required
    Response,
    /// The caller has been silent and a nudge is required
    Reminder,
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnKind::Response => write!(f, "response_required"),
            TurnKind::Reminder => write!(f, "reminder_required"),
        }
    }
}
