//! Provider trait — the abstraction over the hosted chat-completion gateway.
//!
//! A Provider sends a prompt (system instructions + history) to a language
//! model and returns the reply, either all at once or as live text deltas.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::ChatTurn;

/// A chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "google/gemini-3-flash-preview")
    pub model: String,

    /// System prompt followed by the conversation history
    pub messages: Vec<ChatTurn>,

    /// Temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.1
}

/// A complete reply from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated text (empty when the model produced nothing)
    pub content: String,

    /// `usage.total_tokens` as reported by the gateway, 0 when absent
    pub tokens_used: u32,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// The core Provider trait.
///
/// The assistant calls `complete()` or `stream()` without knowing which
/// gateway is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Send a request and wait for the complete reply.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Send a request and hand every text delta to `on_delta` as soon as it
    /// is decoded. The returned response carries the reassembled reply.
    ///
    /// Default implementation calls `complete()` and emits the whole reply
    /// as a single delta.
    async fn stream(
        &self,
        request: ProviderRequest,
        on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let response = self.complete(request).await?;
        if !response.content.is_empty() {
            on_delta(&response.content);
        }
        Ok(response)
    }
}
