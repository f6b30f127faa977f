//! HTTP-callback transport for the chat platform.
//!
//! The chat platform POSTs each inbound message to `/bot/callback`; the reply
//! payload goes back in the response body. Unauthenticated callbacks are
//! rejected before any message content is looked at.

use crate::commands::{dispatch, BotConfig};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use paddock_core::HostRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Header carrying the shared callback secret.
const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Shared state for the bot callback routes.
pub struct BotState {
    pub registry: Arc<HostRegistry>,
    pub config: BotConfig,
}

/// Inbound chat message, as delivered by the platform callback.
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub text: TextContent,
    #[serde(default)]
    pub sender_nick: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    pub content: String,
}

/// Reply payload in the platform's robot message format.
#[derive(Debug, Serialize)]
pub struct ReplyMessage {
    pub msgtype: String,
    pub text: ReplyText,
}

#[derive(Debug, Serialize)]
pub struct ReplyText {
    pub content: String,
}

impl ReplyMessage {
    fn text(content: String) -> Self {
        Self {
            msgtype: "text".to_string(),
            text: ReplyText { content },
        }
    }
}

/// Build the bot callback router.
pub fn build_router(state: Arc<BotState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/bot/callback", post(callback_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "paddock-bot",
    }))
}

/// Whether the callback carries the expected shared secret.
fn authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        // No secret configured: accept everything (development setups)
        return true;
    };
    headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|token| token == secret)
        .unwrap_or(false)
}

async fn callback_handler(
    State(state): State<Arc<BotState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !authorized(&headers, state.config.callback_secret.as_deref()) {
        tracing::warn!("Rejected chat callback with bad or missing token");
        return StatusCode::FORBIDDEN.into_response();
    }

    let message: ChatMessage = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(error) => {
            tracing::warn!(%error, "Rejected malformed chat callback");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Some(nick) = &message.sender_nick {
        tracing::debug!(sender = %nick, "Chat message received");
    }

    match dispatch(&message.text.content, &state.registry, &state.config).await {
        Some(reply) => Json(ReplyMessage::text(reply)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Start the bot callback server; runs until the shutdown future resolves.
pub async fn serve(
    state: Arc<BotState>,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let router = build_router(state);

    tracing::info!(%addr, "Starting bot callback server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
