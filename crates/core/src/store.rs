//! SessionStore trait — persistence for sessions and their messages.
//!
//! Invariants every backend upholds:
//! - messages in a session are ordered by `created_at`, ties by insertion
//! - appending a message moves the session's `updated_at` to the message time
//! - deleting a session deletes all of its messages

use async_trait::async_trait;
use crate::error::StoreError;
use crate::message::{Message, Role, Session, SessionId};

/// The core SessionStore trait.
///
/// Implementations: SQLite, in-memory (for tests and ephemeral runs).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Create a new, empty session.
    async fn create_session(&self) -> Result<Session, StoreError>;

    /// Return the session with this ID, creating it if it does not exist.
    async fn ensure_session(&self, id: &SessionId) -> Result<Session, StoreError>;

    /// Get a session by ID.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// All sessions, most recently updated first.
    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;

    /// Append a message and bump the session's `updated_at`.
    async fn append_message(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// All messages of a session, oldest first.
    async fn messages(&self, session_id: &SessionId) -> Result<Vec<Message>, StoreError>;

    /// The `limit` most recent messages of a session, oldest first.
    async fn recent_messages(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    /// Delete a session and all of its messages. Returns whether it existed.
    async fn delete_session(&self, id: &SessionId) -> Result<bool, StoreError>;
}
