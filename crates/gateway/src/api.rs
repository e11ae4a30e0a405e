//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST   /v1/chat`                  — Send a message, get the full reply
//! - `POST   /v1/chat/stream`           — Send a message, get an SSE stream
//! - `GET    /v1/sessions`              — List sessions, most recent first
//! - `POST   /v1/sessions`              — Create a session
//! - `GET    /v1/sessions/{id}/messages` — Messages of a session, oldest first
//! - `DELETE /v1/sessions/{id}`         — Delete a session and its messages
//! - `GET    /v1/docs`                  — The documentation list, optionally ranked by `?q=`

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

use supportdesk_agent::{ReplyEvent, SupportAssistant};
use supportdesk_core::docs::DocEntry;
use supportdesk_core::error::{Error, StoreError};
use supportdesk_core::message::{Message, Session, SessionId};

use crate::SharedState;

const MISSING_FIELDS: &str = "Missing sessionId or message";
const RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";
const CREDITS_EXHAUSTED: &str = "AI credits exhausted. Please add credits.";

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/sessions", get(list_sessions_handler).post(create_session_handler))
        .route("/sessions/{id}", delete(delete_session_handler))
        .route("/sessions/{id}/messages", get(list_messages_handler))
        .route("/docs", get(list_docs_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    /// Both fields, or a 400 when either is absent or empty.
    fn into_parts(self) -> Result<(SessionId, String), ApiError> {
        match (self.session_id, self.message) {
            (Some(id), Some(message)) if !id.is_empty() && !message.is_empty() => {
                Ok((SessionId::from(id), message))
            }
            _ => Err(ApiError::new(StatusCode::BAD_REQUEST, MISSING_FIELDS)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    pub tokens_used: u32,
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocsQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocsResponse {
    pub docs: Vec<DocView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocView {
    pub title: String,
    pub content: String,
    pub keywords: Vec<String>,
    /// Present only when the list was ranked against a query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl DocView {
    fn new(doc: &DocEntry, score: Option<u32>) -> Self {
        Self {
            title: doc.title.clone(),
            content: doc.content.clone(),
            keywords: doc.keywords.clone(),
            score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// A failed request: status code plus the `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = status_for(&err);
        let message = match &err {
            Error::Provider(p) if p.is_rate_limited() => RATE_LIMITED.to_string(),
            Error::Provider(p) if p.is_quota_exhausted() => CREDITS_EXHAUSTED.to_string(),
            Error::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        };
        Self { status, message }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Error::Store(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::Busy(_) => StatusCode::CONFLICT,
        Error::Provider(p) if p.is_rate_limited() => StatusCode::TOO_MANY_REQUESTS,
        Error::Provider(p) if p.is_quota_exhausted() => StatusCode::PAYMENT_REQUIRED,
        Error::Store(StoreError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Chat ──────────────────────────────────────────────────────────────────

/// `POST /v1/chat` — Answer one message and return the whole reply.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (session_id, message) = payload.into_parts()?;
    info!(session = %session_id, message_len = message.len(), "v1/chat request");

    let reply = state
        .assistant
        .reply(&session_id, &message)
        .await
        .inspect_err(|e| error!(session = %session_id, error = %e, "Chat failed"))?;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        tokens_used: reply.tokens_used,
        sources: reply.sources,
    }))
}

/// `POST /v1/chat/stream` — Answer one message as an SSE stream of
/// `delta` events followed by exactly one `done` or `error` event.
async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let (session_id, message) = payload.into_parts()?;
    info!(session = %session_id, message_len = message.len(), "v1/chat/stream SSE request");

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(stream_reply(state.assistant.clone(), session_id, message, tx));

    let stream = UnboundedReceiverStream::new(rx).map(|event: ReplyEvent| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event.event_type()).data(data))
    });

    Ok(Sse::new(stream))
}

/// Runs one streamed reply, forwarding events to the SSE response.
/// Returns early, dropping the upstream stream, once the client is gone.
async fn stream_reply(
    assistant: Arc<SupportAssistant>,
    session_id: SessionId,
    message: String,
    tx: mpsc::UnboundedSender<ReplyEvent>,
) {
    let deltas = tx.clone();
    let mut on_delta = move |content: &str| {
        let _ = deltas.send(ReplyEvent::Delta {
            content: content.to_string(),
        });
    };

    let result = tokio::select! {
        result = assistant.reply_streaming(&session_id, &message, &mut on_delta) => result,
        _ = tx.closed() => {
            debug!(session = %session_id, "SSE client disconnected, abandoning reply");
            return;
        }
    };

    let event = match result {
        Ok(reply) => ReplyEvent::Done {
            reply: reply.reply,
            tokens_used: reply.tokens_used,
        },
        Err(e) => {
            warn!(session = %session_id, error = %e, "Streamed chat failed");
            let err = ApiError::from(e);
            ReplyEvent::Error {
                error: err.message,
                status: err.status.as_u16(),
            }
        }
    };
    let _ = tx.send(event);
}

// ── Sessions ──────────────────────────────────────────────────────────────

/// `GET /v1/sessions`, a bare array, most recently active first.
async fn list_sessions_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let sessions = state.assistant.store().list_sessions().await?;
    Ok(Json(sessions))
}

/// `POST /v1/sessions`
async fn create_session_handler(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = state.assistant.store().create_session().await?;
    debug!(session = %session.id, "Session created");
    Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /v1/sessions/{id}/messages`, a bare array, oldest first.
async fn list_messages_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let session_id = SessionId::from(id);
    let store = state.assistant.store();
    if store.get_session(&session_id).await?.is_none() {
        return Err(StoreError::SessionNotFound(session_id.to_string()).into());
    }

    let messages = store.messages(&session_id).await?;
    Ok(Json(messages))
}

/// `DELETE /v1/sessions/{id}`
async fn delete_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteResponse>), ApiError> {
    let session_id = SessionId::from(id);
    let success = state.assistant.store().delete_session(&session_id).await?;
    let status = if success {
        info!(session = %session_id, "Session deleted");
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(DeleteResponse { success })))
}

// ── Docs ──────────────────────────────────────────────────────────────────

/// `GET /v1/docs` — all documents in catalog order, or with `?q=` the
/// top matches for that query, best first.
async fn list_docs_handler(
    State(state): State<SharedState>,
    Query(query): Query<DocsQuery>,
) -> Json<DocsResponse> {
    let assistant = &state.assistant;
    let docs = match query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) => assistant
            .scorer()
            .rank(q, assistant.docs().docs())
            .into_iter()
            .map(|s| DocView::new(s.doc, Some(s.score)))
            .collect(),
        None => assistant
            .docs()
            .docs()
            .iter()
            .map(|d| DocView::new(d, None))
            .collect(),
    };
    Json(DocsResponse { docs })
}
