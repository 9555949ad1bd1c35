//! Per-call session state.
//!
//! A [`Session`] lives as long as one WebSocket connection. It owns the
//! running transcript, the call identity bound from call details, the
//! outbound frame channel, and the turn epoch used to supersede stale
//! generations.
//!
//! The epoch is a monotonically increasing counter. Admitting a turn
//! advances it and stamps the turn with the new value; a running turn
//! compares its stamp against the current value before each delta and
//! abandons itself the moment they differ. This gives newest-wins semantics
//! without any task-to-task signalling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::transcript::{Role, TurnKind, Utterance};
use crate::tools::CallContext;

use super::messages::{FrameRoute, OutboundFrame};

/// The outbound channel is gone, meaning the connection is shutting down.
#[derive(Debug, Error)]
#[error("Transport closed")]
pub struct TransportClosed;

/// State for one live call.
pub struct Session {
    /// Gateway-side call identifier from the connection path.
    call_id: String,
    provider_call_sid: Mutex<Option<String>>,
    caller_number: Mutex<Option<String>>,
    transcript: Mutex<Vec<Utterance>>,
    current_epoch: AtomicU64,
    outbound: mpsc::Sender<FrameRoute>,
}

impl Session {
    /// Open a session bound to an outbound frame channel.
    pub fn open(call_id: impl Into<String>, outbound: mpsc::Sender<FrameRoute>) -> Arc<Self> {
        Arc::new(Self {
            call_id: call_id.into(),
            provider_call_sid: Mutex::new(None),
            caller_number: Mutex::new(None),
            transcript: Mutex::new(Vec::new()),
            current_epoch: AtomicU64::new(0),
            outbound,
        })
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Record the provider call SID from call details.
    pub fn bind_provider_call(&self, sid: impl Into<String>) {
        *self.provider_call_sid.lock() = Some(sid.into());
    }

    /// Record the caller's number from call details.
    pub fn bind_caller_number(&self, number: impl Into<String>) {
        *self.caller_number.lock() = Some(number.into());
    }

    /// Snapshot of the per-call facts tools need.
    pub fn call_context(&self) -> CallContext {
        CallContext {
            call_id: self.call_id.clone(),
            provider_call_sid: self.provider_call_sid.lock().clone(),
            caller_number: self.caller_number.lock().clone(),
        }
    }

    /// Append one utterance to the transcript.
    pub fn record_utterance(&self, role: Role, content: impl Into<String>) {
        self.transcript.lock().push(Utterance::new(role, content));
    }

    /// Replace the transcript with the platform's authoritative copy.
    pub fn replace_transcript(&self, transcript: Vec<Utterance>) {
        *self.transcript.lock() = transcript;
    }

    /// Clone of the current transcript.
    pub fn transcript_snapshot(&self) -> Vec<Utterance> {
        self.transcript.lock().clone()
    }

    /// Advance the epoch, superseding any in-flight turn, and return the
    /// new value.
    pub fn advance_epoch(&self) -> u64 {
        self.current_epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The current epoch value.
    pub fn current_epoch(&self) -> u64 {
        self.current_epoch.load(Ordering::Acquire)
    }

    /// Queue a frame for the sender task.
    pub async fn send(&self, frame: OutboundFrame) -> Result<(), TransportClosed> {
        self.outbound
            .send(FrameRoute::Frame(frame))
            .await
            .map_err(|_| TransportClosed)
    }

    /// Ask the sender task to close the socket.
    pub async fn close_transport(&self, code: u16, reason: impl Into<String>) {
        // A full or closed channel here means the connection is already
        // going away, which is the outcome we wanted.
        let _ = self
            .outbound
            .send(FrameRoute::Close {
                code,
                reason: reason.into(),
            })
            .await;
    }

    /// Mark the session over. Any turn still running sees a fresh epoch
    /// and abandons itself.
    pub fn close(&self) {
        self.advance_epoch();
        debug!(call_id = %self.call_id, "Session closed");
    }
}

/// An admitted unit of generation work.
#[derive(Debug)]
pub struct TurnRequest {
    pub response_id: u64,
    pub kind: TurnKind,
    pub transcript: Vec<Utterance>,
    /// Epoch stamped at admission; the turn is live while this matches
    /// the session's current epoch.
    pub epoch: u64,
}

impl TurnRequest {
    /// Admit a turn: store the platform's transcript, supersede whatever
    /// was running, and stamp the new turn.
    pub fn admit(
        session: &Session,
        response_id: u64,
        kind: TurnKind,
        transcript: Vec<Utterance>,
    ) -> Self {
        session.replace_transcript(transcript);
        let epoch = session.advance_epoch();
        debug!(
            call_id = %session.call_id(),
            response_id,
            turn = %kind,
            epoch,
            "Turn admitted"
        );
        Self {
            response_id,
            kind,
            transcript: session.transcript_snapshot(),
            epoch,
        }
    }

    /// Whether this turn still owns the session's response window.
    pub fn is_live(&self, session: &Session) -> bool {
        session.current_epoch() == self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> (Arc<Session>, mpsc::Receiver<FrameRoute>) {
        let (tx, rx) = mpsc::channel(16);
        (Session::open("call-1", tx), rx)
    }

    #[test]
    fn test_epoch_advances_monotonically() {
        let (session, _rx) = test_session();
        assert_eq!(session.current_epoch(), 0);
        assert_eq!(session.advance_epoch(), 1);
        assert_eq!(session.advance_epoch(), 2);
        assert_eq!(session.current_epoch(), 2);
    }

    #[test]
    fn test_admission_supersedes_previous_turn() {
        let (session, _rx) = test_session();
        let first = TurnRequest::admit(&session, 1, TurnKind::Response, vec![]);
        assert!(first.is_live(&session));

        let second = TurnRequest::admit(&session, 2, TurnKind::Response, vec![]);
        assert!(!first.is_live(&session));
        assert!(second.is_live(&session));
    }

    #[test]
    fn test_reminder_admission_supersedes_too() {
        let (session, _rx) = test_session();
        let response = TurnRequest::admit(&session, 1, TurnKind::Response, vec![]);
        let reminder = TurnRequest::admit(&session, 2, TurnKind::Reminder, vec![]);
        assert!(!response.is_live(&session));
        assert!(reminder.is_live(&session));
    }

    #[test]
    fn test_close_supersedes_in_flight_turn() {
        let (session, _rx) = test_session();
        let turn = TurnRequest::admit(&session, 1, TurnKind::Response, vec![]);
        session.close();
        assert!(!turn.is_live(&session));
    }

    #[test]
    fn test_admission_replaces_transcript() {
        let (session, _rx) = test_session();
        session.record_utterance(Role::Agent, "stale greeting");

        let fresh = vec![Utterance::new(Role::Caller, "hello")];
        let turn = TurnRequest::admit(&session, 1, TurnKind::Response, fresh);
        assert_eq!(turn.transcript.len(), 1);
        assert_eq!(session.transcript_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_send_after_receiver_drop_reports_closed() {
        let (session, rx) = test_session();
        drop(rx);
        let result = session.send(OutboundFrame::session_config()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_call_context_carries_bound_identity() {
        let (session, _rx) = test_session();
        session.bind_provider_call("CA123");
        session.bind_caller_number("+15550177");

        let context = session.call_context();
        assert_eq!(context.call_id, "call-1");
        assert_eq!(context.provider_call_sid.as_deref(), Some("CA123"));
        assert_eq!(context.caller_number.as_deref(), Some("+15550177"));
    }
}
