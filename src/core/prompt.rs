//! Prompt assembly for response generation.
//!
//! Builds the chat-message sequence sent to the generation backend for each
//! turn: a fixed system prompt describing the agent persona, the running
//! transcript mapped to chat roles, and for reminder turns a trailing cue
//! that prompts the agent to re-engage a silent caller.

use crate::core::llm::ChatMessage;
use crate::core::transcript::{Role, TurnKind, Utterance};

/// First utterance of every call, spoken by the agent before the caller
/// says anything. Recorded into the transcript so later turns see it.
pub const BEGIN_SENTENCE: &str =
    "Good morning, Front Desk, this is Eefa. How may I assist you today?";

/// System prompt establishing the agent persona and style constraints.
const AGENT_PROMPT: &str = "\
You are Eefa, a friendly and professional front-desk voice agent. \
You answer inbound phone calls, help callers with their questions, and \
route them to the right place.\n\
\n\
Style: this is a spoken phone conversation, so respond the way a person \
talks. Keep replies short, usually one or two sentences. Never use lists, \
markdown, or other written formatting. Ask one question at a time.\n\
\n\
If the caller asks to speak with a person, use the transfer_call tool. \
If the person they need is unavailable, offer to take a message with the \
take_message tool. When the caller is done and says goodbye, say goodbye \
and use the end_call tool.";

/// Appended to the transcript on reminder turns, where the caller has gone
/// quiet and the agent should speak next without new input.
const REMINDER_CUE: &str = "(Now the user has not responded in a while, you would say:)";

/// Map the transcript and turn kind to the backend message sequence.
pub fn build_turn_prompt(kind: TurnKind, transcript: &[Utterance]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 2);
    messages.push(ChatMessage::system(AGENT_PROMPT));

    for utterance in transcript {
        messages.push(match utterance.role {
            Role::Agent => ChatMessage::assistant(&utterance.content),
            Role::Caller => ChatMessage::user(&utterance.content),
        });
    }

    if kind == TurnKind::Reminder {
        messages.push(ChatMessage::user(REMINDER_CUE));
    }

    messages
}
