//! SQLite session store.
//!
//! Uses a single SQLite database file with two tables:
//! - `sessions` — one row per support session
//! - `messages` — the messages of every session, `ON DELETE CASCADE`
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so lexical order is chronological order. Each table carries an integer
//! `iid` to break timestamp ties by insertion order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use supportdesk_core::error::StoreError;
use supportdesk_core::message::{Message, Role, Session, SessionId};
use supportdesk_core::store::SessionStore;
use tracing::{debug, info};

/// A SQLite-backed [`SessionStore`].
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (or create) a store at `path`.
    ///
    /// The database and all tables/indexes are created automatically.
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // Every connection to `:memory:` is its own database.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite session store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("sessions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                role        TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, created_at, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("updated_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        Ok(Session {
            id: SessionId(id),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| StoreError::QueryFailed(format!("session_id column: {e}")))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        Ok(Message {
            id,
            session_id: SessionId(session_id),
            role: Role::parse(&role)
                .ok_or_else(|| StoreError::QueryFailed(format!("unknown role '{role}'")))?,
            content,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query("SELECT id, created_at, updated_at FROM sessions WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Get session: {e}")))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_session(&self) -> Result<Session, StoreError> {
        let mut session = Session::new();
        session.created_at = session.created_at.trunc_subsecs(6);
        session.updated_at = session.created_at;
        sqlx::query("INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?3)")
            .bind(session.id.as_str())
            .bind(format_timestamp(&session.created_at))
            .bind(format_timestamp(&session.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("INSERT session failed: {e}")))?;

        debug!(session = %session.id, "Created session");
        Ok(session)
    }

    async fn ensure_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        let fresh = Session::with_id(id.clone());
        sqlx::query(
            "INSERT OR IGNORE INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(id.as_str())
        .bind(format_timestamp(&fresh.created_at))
        .bind(format_timestamp(&fresh.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT session failed: {e}")))?;

        self.fetch_session(id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        self.fetch_session(id).await
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, created_at, updated_at FROM sessions ORDER BY updated_at DESC, iid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("List sessions: {e}")))?;

        rows.iter().map(Self::row_to_session).collect()
    }

    async fn append_message(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut message = Message::new(session_id.clone(), role, content);
        message.created_at = message.created_at.trunc_subsecs(6);
        let created_at = format_timestamp(&message.created_at);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let bumped = sqlx::query(
            "UPDATE sessions SET updated_at = MAX(updated_at, ?1) WHERE id = ?2",
        )
        .bind(&created_at)
        .bind(session_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("UPDATE session failed: {e}")))?;

        if bumped.rows_affected() == 0 {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }

        sqlx::query(
            "INSERT INTO messages (id, session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(session_id.as_str())
        .bind(role.as_str())
        .bind(content)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT message failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(session = %session_id, role = %role, "Stored message {}", message.id);
        Ok(message)
    }

    async fn messages(&self, session_id: &SessionId) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, created_at
            FROM messages
            WHERE session_id = ?1
            ORDER BY created_at ASC, iid ASC
            "#,
        )
        .bind(session_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("List messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn recent_messages(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, created_at
            FROM messages
            WHERE session_id = ?1
            ORDER BY created_at DESC, iid DESC
            LIMIT ?2
            "#,
        )
        .bind(session_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Recent messages: {e}")))?;

        let mut messages = rows
            .iter()
            .map(Self::row_to_message)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
