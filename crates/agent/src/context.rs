//! Conversation history window.
//!
//! The assistant sees at most the last `pairs` user/assistant exchanges,
//! i.e. the `2 × pairs` most recent messages of a session, oldest first.
//! Pairs are counted by position, not by role: a session with an odd
//! number of messages still yields the newest `2 × pairs` of them.

use std::sync::Arc;
use supportdesk_core::error::StoreError;
use supportdesk_core::message::{Message, SessionId};
use supportdesk_core::store::SessionStore;

/// Default number of exchanges kept in the prompt.
pub const DEFAULT_HISTORY_PAIRS: usize = 5;

/// The last `n` pairs (`2n` messages) of an already loaded, oldest-first
/// message list.
pub fn last_n_pairs(messages: &[Message], n: usize) -> &[Message] {
    let keep = n.saturating_mul(2);
    &messages[messages.len().saturating_sub(keep)..]
}

/// Loads the bounded history window for a session.
pub struct ContextAssembler {
    store: Arc<dyn SessionStore>,
    pairs: usize,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn SessionStore>, pairs: usize) -> Self {
        Self { store, pairs }
    }

    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// The last `pairs × 2` messages of `session_id`, oldest first.
    pub async fn recent_history(&self, session_id: &SessionId) -> Result<Vec<Message>, StoreError> {
        self.store
            .recent_messages(session_id, self.pairs.saturating_mul(2))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supportdesk_core::message::Role;
    use supportdesk_memory::InMemorySessionStore;

    fn conversation(len: usize) -> Vec<Message> {
        let id = SessionId::from("s");
        (0..len)
            .map(|i| Message::new(id.clone(), Role::User, format!("m{i}")))
            .collect()
    }

    fn contents(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn last_pairs_slice() {
        let messages = conversation(7);
        assert_eq!(contents(last_n_pairs(&messages, 2)), vec!["m3", "m4", "m5", "m6"]);
        assert_eq!(last_n_pairs(&messages, 10).len(), 7);
        assert!(last_n_pairs(&messages, 0).is_empty());
        assert!(last_n_pairs(&[], 5).is_empty());
    }

    #[test]
    fn huge_pair_count_does_not_overflow() {
        let messages = conversation(3);
        assert_eq!(last_n_pairs(&messages, usize::MAX).len(), 3);
    }

    #[tokio::test]
    async fn recent_history_uses_window() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = store.create_session().await.unwrap();
        for i in 0..13 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store
                .append_message(&session.id, role, &format!("m{i}"))
                .await
                .unwrap();
        }

        let assembler = ContextAssembler::new(store.clone(), DEFAULT_HISTORY_PAIRS);
        let history = assembler.recent_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.first().unwrap().content, "m3");
        assert_eq!(history.last().unwrap().content, "m12");

        let all = store.messages(&session.id).await.unwrap();
        assert_eq!(contents(last_n_pairs(&all, 5)), contents(&history));
    }
}
