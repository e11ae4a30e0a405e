//! Error types for the SupportDesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for all SupportDesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Request validation ---
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Another message for the same session is still being answered.
    #[error("Session {0} already has a reply in flight")]
    Busy(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Non-success HTTP status returned before any streaming began.
    #[error("Upstream request failed: {message} (status: {status_code})")]
    Upstream { status_code: u16, message: String },

    /// The response was successful but carried no body to read.
    #[error("Upstream response had no body")]
    MissingBody,

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// The HTTP status reported by the gateway, if this is an upstream failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Upstream { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// `429 Too Many Requests`.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }

    /// `402 Payment Required` — the gateway's credits are used up.
    pub fn is_quota_exhausted(&self) -> bool {
        self.status_code() == Some(402)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
