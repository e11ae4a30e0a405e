//! Streaming reply events.
//!
//! `ReplyEvent` is what the gateway forwards to clients over SSE while a
//! reply is being generated:
//! - `delta` — a piece of reply text, in order
//! - `done`  — the full reply and token usage, sent once at the end
//! - `error` — generation failed; no `done` follows

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyEvent {
    /// Partial text from the model.
    Delta { content: String },

    /// The reply is complete and persisted.
    Done {
        reply: String,
        #[serde(rename = "tokensUsed")]
        tokens_used: u32,
    },

    /// Generation failed.
    Error { error: String, status: u16 },
}

impl ReplyEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Delta { .. } => "delta",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
