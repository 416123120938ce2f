//! HTTP chat API.
//!
//! A thin axum wrapper over [`CoachAgent`]: `POST /chat` processes one
//! turn, `POST /reset` clears a session, `GET /healthz` reports liveness.
//! The agent is synchronous, so handlers bridge through `spawn_blocking`;
//! a turn blocked on an external call never stalls the runtime.
//!
//! `/chat` never returns a structured error for internal failures: the
//! agent's own fallback reply is the conversational error surface.
//! Transport-level 4xx applies only to malformed request JSON.

use crate::agent::{CoachAgent, FALLBACK_REPLY};
use crate::config::ServerSettings;
use crate::{Error, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    agent: Arc<CoachAgent>,
}

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Session to continue; a fresh id is minted when omitted.
    #[serde(default)]
    pub session_id: Option<String>,
    /// The user message.
    pub message: String,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The session the turn was recorded under.
    pub session_id: String,
    /// The assistant reply.
    pub response: String,
}

/// Request body for `POST /reset`.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    /// Session to reset.
    pub session_id: String,
}

/// Response body for `POST /reset`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Always `"reset"`.
    pub status: String,
}

/// Builds the API router over an agent.
#[must_use]
pub fn router(agent: Arc<CoachAgent>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { agent })
}

/// Runs the server until interrupted.
///
/// # Errors
///
/// Returns an error if the bind address is invalid, the runtime cannot be
/// created, or serving fails.
pub fn serve(agent: Arc<CoachAgent>, settings: &ServerSettings) -> Result<()> {
    let addr: std::net::SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| {
            Error::InvalidInput(format!(
                "invalid bind address {}:{}: {e}",
                settings.host, settings.port
            ))
        })?;

    let app = router(agent);

    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "bind".to_string(),
                cause: e.to_string(),
            })?;

        tracing::info!(%addr, "chat API listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutdown signal received");
            })
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "serve".to_string(),
                cause: e.to_string(),
            })
    })
}

/// `POST /chat` handler.
async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let agent = Arc::clone(&state.agent);
    let id = session_id.clone();
    let message = request.message;

    let response = tokio::task::spawn_blocking(move || agent.respond(&id, &message))
        .await
        .unwrap_or_else(|err| {
            tracing::error!("chat task failed: {err}");
            FALLBACK_REPLY.to_string()
        });

    Json(ChatResponse {
        session_id,
        response,
    })
}

/// `POST /reset` handler.
async fn reset(State(state): State<AppState>, Json(request): Json<ResetRequest>) -> Json<ResetResponse> {
    let agent = Arc::clone(&state.agent);
    let result = tokio::task::spawn_blocking(move || {
        agent.reset_session(&request.session_id);
    })
    .await;

    if let Err(err) = result {
        tracing::error!("reset task failed: {err}");
    }
    Json(ResetResponse {
        status: "reset".to_string(),
    })
}

/// `GET /healthz` handler.
async fn healthz() -> &'static str {
    "ok"
}
