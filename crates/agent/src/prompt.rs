//! System prompt rendering.
//!
//! Layout:
//!
//! ```text
//! <role line>
//!
//! ## Product Documentation:
//! **Title**: content
//!
//! **Title**: content
//!
//! ## RULES
//! ...
//! ```
//!
//! With no matching document the documentation block is replaced by
//! `No relevant documentation found.`

use supportdesk_config::AnswerPolicy;
use supportdesk_core::docs::DocEntry;
use supportdesk_core::message::{ChatTurn, Message};

/// The exact reply for questions the documentation does not cover.
pub const FALLBACK_REPLY: &str = "Sorry, I don't have information about that.";

/// Topics listed when greeting the user.
const HELP_TOPICS: &str =
    "password reset, refund policy, billing, account settings, contact support";

/// Renders the system prompt for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptBuilder {
    policy: AnswerPolicy,
}

impl PromptBuilder {
    pub fn new(policy: AnswerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    /// `**Title**: content` blocks joined by a blank line.
    pub fn docs_context(docs: &[&DocEntry]) -> String {
        docs.iter()
            .map(|d| format!("**{}**: {}", d.title, d.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn system_prompt(&self, docs: &[&DocEntry]) -> String {
        let documentation = if docs.is_empty() {
            "No relevant documentation found.".to_string()
        } else {
            format!("## Product Documentation:\n{}", Self::docs_context(docs))
        };

        match self.policy {
            AnswerPolicy::Strict => format!(
                "You are a product support assistant. You MUST ONLY answer questions using the provided product documentation below.\n\n\
                 {documentation}\n\n\
                 ## STRICT RULES:\n\
                 1. If the user's question can be answered using the product documentation above, provide a helpful answer based ONLY on that documentation.\n\
                 2. If the user sends a greeting (hi, hello, hey, etc.), respond with a friendly greeting and briefly list what you can help with ({HELP_TOPICS}).\n\
                 3. If the question CANNOT be answered from the documentation above, you MUST respond EXACTLY with: \"{FALLBACK_REPLY}\"\n\
                 4. Do NOT make up information, guess, or provide answers outside the documentation.\n\
                 5. Keep responses concise and helpful."
            ),
            AnswerPolicy::Open => format!(
                "You are a product support assistant. Prefer the provided product documentation below whenever it covers the question.\n\n\
                 {documentation}\n\n\
                 ## RULES:\n\
                 1. If the user's question can be answered using the product documentation above, base your answer on that documentation.\n\
                 2. If the user sends a greeting (hi, hello, hey, etc.), respond with a friendly greeting and briefly list what you can help with ({HELP_TOPICS}).\n\
                 3. If the documentation does not cover the question, you may answer from general knowledge; say that the answer is not from the product documentation.\n\
                 4. Never contradict the documentation.\n\
                 5. Keep responses concise and helpful."
            ),
        }
    }

    /// The provider messages: system prompt, then the history window
    /// (which already ends with the new user message).
    pub fn turns(&self, docs: &[&DocEntry], history: &[Message]) -> Vec<ChatTurn> {
        std::iter::once(ChatTurn::system(self.system_prompt(docs)))
            .chain(history.iter().map(Message::to_turn))
            .collect()
    }
}
