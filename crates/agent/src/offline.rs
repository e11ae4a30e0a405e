//! Model-free replies.
//!
//! Answers straight from the matched documentation, for demos and for
//! running without gateway credentials.

use supportdesk_core::docs::DocEntry;
use supportdesk_core::message::Message;

use crate::prompt::FALLBACK_REPLY;

const GREETINGS: [&str; 10] = [
    "hi",
    "hello",
    "hellow",
    "hey",
    "howdy",
    "good morning",
    "good evening",
    "good afternoon",
    "sup",
    "yo",
];

pub const GREETING_REPLY: &str = "Hello! I'm your AI Support Assistant. I can help you with questions about password reset, refund policy, billing, account settings, and contacting support. How can I help you today?";

const GREETING_TOKENS: u32 = 20;

/// A reply produced without a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineReply {
    pub reply: String,
    pub tokens_used: u32,
}

/// Whether `message` is one of the known greetings, optionally followed
/// by a single `!`.
pub fn is_greeting(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    let bare = lower.strip_suffix('!').unwrap_or(&lower);
    GREETINGS.contains(&bare)
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResponder;

impl OfflineResponder {
    pub fn new() -> Self {
        Self
    }

    /// Reply to `message` given the documents that matched it and the
    /// conversation window.
    pub fn respond(&self, message: &str, matched: &[&DocEntry], history: &[Message]) -> OfflineReply {
        if is_greeting(message) {
            return OfflineReply {
                reply: GREETING_REPLY.to_string(),
                tokens_used: GREETING_TOKENS,
            };
        }

        if matched.is_empty() {
            return OfflineReply {
                reply: FALLBACK_REPLY.to_string(),
                tokens_used: 0,
            };
        }

        let reply = matched
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let context = history
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let chars = reply.chars().count() + message.chars().count() + context.chars().count();

        OfflineReply {
            reply,
            tokens_used: estimate_tokens(chars),
        }
    }
}
