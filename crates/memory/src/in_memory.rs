//! In-memory session store — useful for testing and ephemeral runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use supportdesk_core::error::StoreError;
use supportdesk_core::message::{Message, Role, Session, SessionId};
use supportdesk_core::store::SessionStore;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    /// Sessions in creation order.
    sessions: Vec<Session>,
    messages: HashMap<SessionId, Vec<Message>>,
}

impl State {
    fn session_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }
}

/// A [`SessionStore`] that keeps everything in process memory.
/// Nothing survives a restart.
pub struct InMemorySessionStore {
    state: Arc<RwLock<State>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create_session(&self) -> Result<Session, StoreError> {
        let session = Session::new();
        self.state.write().await.sessions.push(session.clone());
        Ok(session)
    }

    async fn ensure_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.session_mut(id) {
            return Ok(existing.clone());
        }
        let session = Session::with_id(id.clone());
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let state = self.state.read().await;
        Ok(state.sessions.iter().find(|s| &s.id == id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let state = self.state.read().await;
        // Newest first on equal timestamps, then a stable sort by recency.
        let mut sessions: Vec<Session> = state.sessions.iter().rev().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn append_message(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut state = self.state.write().await;
        let message = Message::new(session_id.clone(), role, content);

        let session = state
            .session_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        session.updated_at = session.updated_at.max(message.created_at);

        state
            .messages
            .entry(session_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn messages(&self, session_id: &SessionId) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        let mut messages = state.messages.get(session_id).cloned().unwrap_or_default();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn recent_messages(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let mut messages = self.messages(session_id).await?;
        let skip = messages.len().saturating_sub(limit);
        messages.drain(..skip);
        Ok(messages)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let len_before = state.sessions.len();
        state.sessions.retain(|s| &s.id != id);
        state.messages.remove(id);
        Ok(state.sessions.len() < len_before)
    }
}
