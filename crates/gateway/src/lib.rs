//! HTTP API gateway for SupportDesk.
//!
//! Exposes the health check and the v1 API: buffered and streamed chat,
//! session management, and the documentation list.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use supportdesk_agent::SupportAssistant;
use supportdesk_config::AppConfig;

/// Shared application state for the gateway.
pub struct AppState {
    pub config: AppConfig,
    pub assistant: Arc<SupportAssistant>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, assistant: SupportAssistant) -> SharedState {
        Arc::new(Self {
            config,
            assistant: Arc::new(assistant),
        })
    }
}

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - CORS from `gateway.cors_origins` (any origin when the list is empty)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Opens the configured session store and builds the assistant once; every
/// request shares them through [`AppState`].
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = supportdesk_memory::open_store(&config).await?;
    let assistant = SupportAssistant::from_config(&config, store)?;

    info!(
        store = assistant.store().name(),
        docs = assistant.docs().len(),
        policy = ?assistant.policy(),
        offline = assistant.is_offline(),
        "Assistant ready"
    );

    let app = build_router(AppState::new(config, assistant));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
