//! End-to-end integration tests for SupportDesk.
//!
//! These tests run the whole pipeline: HTTP request → gateway → assistant →
//! OpenAI-compatible provider → a local fake upstream speaking SSE, with
//! sessions persisted in SQLite.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use supportdesk_agent::{FALLBACK_REPLY, SupportAssistant};
use supportdesk_config::{AnswerPolicy, AppConfig, AssistantMode};
use supportdesk_core::message::{Role, SessionId};
use supportdesk_core::store::SessionStore;
use supportdesk_gateway::{AppState, build_router};
use supportdesk_memory::SqliteSessionStore;

// ── Fake upstream ────────────────────────────────────────────────────────

/// What the fake gateway answers with.
enum Script {
    Reply(&'static str),
    Status(u16),
}

/// A chat-completion gateway that replays scripted answers and records
/// every request body it receives.
struct Upstream {
    script: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl Upstream {
    fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn last_request(&self) -> serde_json::Value {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// SSE frames for `content`, one word per frame, split mid-frame across
/// chunks so the client has to reassemble lines.
fn sse_chunks(content: &str) -> Vec<String> {
    let mut body = String::new();
    for word in content.split_inclusive(' ') {
        let frame = serde_json::json!({ "choices": [{ "delta": { "content": word } }] });
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str(": keep-alive\n");
    body.push_str("data: {\"choices\":[],\"usage\":{\"total_tokens\":21}}\n\n");
    body.push_str("data: [DONE]\n\n");

    let bytes = body.into_bytes();
    bytes
        .chunks(7)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect()
}

async fn completions(
    State(upstream): State<Arc<Upstream>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let stream = body["stream"] == true;
    upstream.requests.lock().unwrap().push(body);

    let script = upstream
        .script
        .lock()
        .unwrap()
        .pop_front()
        .expect("upstream script exhausted");

    match script {
        Script::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(serde_json::json!({ "error": { "message": "scripted failure" } })),
        )
            .into_response(),
        Script::Reply(content) if stream => {
            let chunks = futures::stream::iter(
                sse_chunks(content)
                    .into_iter()
                    .map(Ok::<_, Infallible>),
            );
            Response::builder()
                .header(header::CONTENT_TYPE, "text/event-stream")
                .body(Body::from_stream(chunks))
                .unwrap()
        }
        Script::Reply(content) => Json(serde_json::json!({
            "model": "fake-model",
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "total_tokens": 21 }
        }))
        .into_response(),
    }
}

async fn spawn_upstream(upstream: Arc<Upstream>) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(upstream);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1")
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    app: Router,
    store: Arc<dyn SessionStore>,
    db_url: String,
    _dir: tempfile::TempDir,
}

async fn harness(mut config: AppConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("support.db");
    config.storage.backend = "sqlite".into();
    config.storage.path = Some(db_path.to_string_lossy().into_owned());

    let store = supportdesk_memory::open_store(&config).await.unwrap();
    let assistant = SupportAssistant::from_config(&config, store.clone()).unwrap();
    let app = build_router(AppState::new(config, assistant));

    Harness {
        app,
        store,
        db_url: format!("sqlite://{}", db_path.display()),
        _dir: dir,
    }
}

async fn model_harness(upstream: &Arc<Upstream>) -> Harness {
    let mut config = AppConfig::default();
    config.api_url = spawn_upstream(upstream.clone()).await;
    config.api_key = Some("sk-e2e".into());
    harness(config).await
}

fn chat(uri: &str, session: &str, message: &str) -> Request<Body> {
    let body = serde_json::json!({ "sessionId": session, "message": message });
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// The `data:` payloads of every SSE event named `name`.
fn sse_payloads(text: &str, name: &str) -> Vec<serde_json::Value> {
    let mut payloads = Vec::new();
    let mut current: Option<&str> = None;
    for line in text.lines() {
        if let Some(event) = line.strip_prefix("event: ") {
            current = Some(event);
        } else if let Some(data) = line.strip_prefix("data: ") {
            if current == Some(name) {
                payloads.push(serde_json::from_str(data).unwrap());
            }
        } else if line.is_empty() {
            current = None;
        }
    }
    payloads
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn streamed_chat_relays_deltas_and_persists_reply() {
    let upstream = Upstream::new(vec![Script::Reply(
        "Refunds are allowed within 7 days of purchase.",
    )]);
    let h = model_harness(&upstream).await;

    let (status, text) = send(
        &h.app,
        chat("/v1/chat/stream", "e2e-stream", "What is your refund policy?"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let deltas: String = sse_payloads(&text, "delta")
        .iter()
        .map(|d| d["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(deltas, "Refunds are allowed within 7 days of purchase.");

    let done = sse_payloads(&text, "done");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0]["reply"], deltas);
    assert_eq!(done[0]["tokensUsed"], 21);
    assert!(sse_payloads(&text, "error").is_empty());

    // The upstream saw the strict prompt grounded on the refund document.
    let request = upstream.last_request();
    assert_eq!(request["stream"], true);
    let system = request["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("**Refund Policy**"));
    assert!(system.contains(FALLBACK_REPLY));

    // Both messages survive a reopen of the database.
    let reopened = SqliteSessionStore::new(&h.db_url).await.unwrap();
    let messages = reopened.messages(&SessionId::from("e2e-stream")).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].content, deltas);
}

#[tokio::test]
async fn buffered_chat_returns_reply_and_tokens() {
    let upstream = Upstream::new(vec![Script::Reply("Go to Settings > Billing.")]);
    let h = model_harness(&upstream).await;

    let (status, body) = send(&h.app, chat("/v1/chat", "e2e-buffered", "billing")).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["reply"], "Go to Settings > Billing.");
    assert_eq!(json["tokensUsed"], 21);
    assert_eq!(upstream.last_request()["stream"], false);
}

#[tokio::test]
async fn upstream_rate_limit_surfaces_as_429() {
    let upstream = Upstream::new(vec![Script::Status(429), Script::Status(429)]);
    let h = model_harness(&upstream).await;

    let (status, body) = send(&h.app, chat("/v1/chat", "e2e-429", "refund")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Rate limit exceeded. Please try again later.");

    let (status, text) = send(&h.app, chat("/v1/chat/stream", "e2e-429", "refund")).await;
    assert_eq!(status, StatusCode::OK);
    let errors = sse_payloads(&text, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["status"], 429);
    assert!(sse_payloads(&text, "delta").is_empty());
    assert!(sse_payloads(&text, "done").is_empty());

    // Only the two user messages were stored.
    let messages = h.store.messages(&SessionId::from("e2e-429")).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.role == Role::User));
}

#[tokio::test]
async fn upstream_out_of_credits_surfaces_as_402() {
    let upstream = Upstream::new(vec![Script::Status(402)]);
    let h = model_harness(&upstream).await;

    let (status, body) = send(&h.app, chat("/v1/chat", "e2e-402", "refund")).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "AI credits exhausted. Please add credits.");
}

#[tokio::test]
async fn empty_upstream_reply_becomes_fallback() {
    let upstream = Upstream::new(vec![Script::Reply("")]);
    let h = model_harness(&upstream).await;

    let (_, text) = send(&h.app, chat("/v1/chat/stream", "e2e-empty", "tell me a joke")).await;
    let done = sse_payloads(&text, "done");
    assert_eq!(done[0]["reply"], FALLBACK_REPLY);

    let messages = h.store.messages(&SessionId::from("e2e-empty")).await.unwrap();
    assert_eq!(messages[1].content, FALLBACK_REPLY);
}

#[tokio::test]
async fn history_window_limits_upstream_context() {
    let upstream = Upstream::new((0..7).map(|_| Script::Reply("ok")).collect());
    let h = model_harness(&upstream).await;

    for i in 0..7 {
        let (status, _) = send(&h.app, chat("/v1/chat", "e2e-history", &format!("question {i}"))).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(upstream.request_count(), 7);

    // system prompt + last 5 pairs, ending with the newest user message
    let messages = upstream.last_request()["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 11);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[10]["content"], "question 6");
    assert_eq!(messages[1]["content"], "ok");

    let stored = h.store.messages(&SessionId::from("e2e-history")).await.unwrap();
    assert_eq!(stored.len(), 14);
}

#[tokio::test]
async fn offline_mode_over_http() {
    let mut config = AppConfig::default();
    config.assistant.mode = AssistantMode::Offline;
    let h = harness(config).await;

    let (_, body) = send(&h.app, chat("/v1/chat", "e2e-offline", "hello!")).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["tokensUsed"], 20);

    let (_, body) = send(&h.app, chat("/v1/chat", "e2e-offline", "how do I reset my password")).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["reply"].as_str().unwrap().contains("Forgot Password"));
    assert!(json["tokensUsed"].as_u64().unwrap() > 0);

    let (_, text) = send(&h.app, chat("/v1/chat/stream", "e2e-offline", "quantum physics")).await;
    assert_eq!(sse_payloads(&text, "done")[0]["reply"], FALLBACK_REPLY);
    assert_eq!(sse_payloads(&text, "delta")[0]["content"], FALLBACK_REPLY);

    let (status, body) = send(
        &h.app,
        Request::builder()
            .uri("/v1/sessions")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["id"], "e2e-offline");
}

#[tokio::test]
async fn open_policy_serves_general_docs() {
    let mut config = AppConfig::default();
    config.assistant.mode = AssistantMode::Offline;
    config.retrieval.policy = AnswerPolicy::Open;
    let h = harness(config).await;

    let (status, body) = send(
        &h.app,
        Request::builder().uri("/v1/docs").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["docs"].as_array().unwrap().len(), 18);
}

#[tokio::test]
async fn health_reports_version() {
    let mut config = AppConfig::default();
    config.assistant.mode = AssistantMode::Offline;
    let h = harness(config).await;

    let (status, body) = send(
        &h.app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
