//! Web chat widget and JSON API.
//!
//! One process-wide chat session sits behind a mutex, so turns from
//! concurrent requests run one after another in submission order.

use super::start;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{ChatSession, DisplayEntry, TurnState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

const WIDGET_HTML: &str = include_str!("widget.html");

/// Shared application state.
pub struct AppState {
    title: String,
    session: Arc<Mutex<ChatSession>>,
}

impl AppState {
    pub fn new(title: &str, session: ChatSession) -> Self {
        Self {
            title: title.to_string(),
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// Build the HTTP routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/messages", get(messages))
        .route("/api/chat", post(chat))
        .route("/api/clear", post(clear))
        .layer(cors)
        .with_state(state)
}

/// Run the web chat server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let title = settings.general.title.clone();

    let orchestrator = start(Operation::Answer, settings).await?;
    let state = Arc::new(AppState::new(&title, orchestrator.new_session()));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header(&title);
    println!();
    Output::success(&format!("Chat available at http://{}", addr));
    Output::kv("Corpus chunks", &orchestrator.corpus().len().to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Widget", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Messages", "GET  /api/messages");
    Output::kv("Chat", "POST /api/chat");
    Output::kv("Clear", "POST /api/clear");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ErrorInfo {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
    state: TurnState,
    messages: Vec<DisplayEntry>,
}

#[derive(Serialize)]
struct MessagesResponse {
    state: TurnState,
    messages: Vec<DisplayEntry>,
}

// === Handlers ===

async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(WIDGET_HTML.replace("{{title}}", &escape_html(&state.title)))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn messages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(MessagesResponse {
        state: session.state(),
        messages: session.display().to_vec(),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": { "kind": "invalid_input", "message": "Message is empty" } })),
        )
            .into_response();
    }

    // The turn owns the lock and runs on its own task, so a client that
    // disconnects mid-turn does not leave the session half-updated.
    let session = state.session.clone().lock_owned().await;
    let turn = tokio::spawn(async move {
        let mut session = session;
        let result = session.submit(&req.message).await;
        ChatResponse {
            state: session.state(),
            messages: session.display().to_vec(),
            reply: result.as_ref().ok().cloned(),
            error: result.err().map(|e| ErrorInfo {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    });

    match turn.await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("Chat turn task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": { "kind": "internal", "message": "Chat turn failed" } })),
            )
                .into_response()
        }
    }
}

async fn clear(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    session.clear();
    Json(MessagesResponse {
        state: session.state(),
        messages: session.display().to_vec(),
    })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
