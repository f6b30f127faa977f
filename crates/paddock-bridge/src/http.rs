//! REST API of the bridge.
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check
//! - `GET /gpu/status` - GPU usage for every configured host
//! - `GET /gpu/status?host=X` - GPU usage for one host
//! - `POST /approval/callback` - Approval-workflow webhook

use crate::config::BridgeConfig;
use crate::webhook::{vm_spec_from_form, ApprovalEvent, APPROVAL_EVENT_TYPE, COMPLETED_STATUS};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use paddock_bot::Notifier;
use paddock_core::{gpu_status, provision_vm, HostRegistry};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Header carrying the shared callback secret.
const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Shared state for the REST routes.
pub struct AppState {
    pub registry: Arc<HostRegistry>,
    pub notifier: Arc<Notifier>,
    pub config: BridgeConfig,
}

/// Build the REST API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/gpu/status", get(gpu_status_handler))
        .route("/approval/callback", post(approval_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "paddock-bridge",
        "message": "chat / hypervisor GPU bridge is running",
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "paddock-bridge",
    }))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    host: Option<String>,
}

async fn gpu_status_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Response {
    match query.host {
        Some(host) => match gpu_status(&state.registry, &host).await {
            Ok(report) => Json(json!({
                "host": host,
                "success": true,
                "data": report,
            }))
            .into_response(),
            Err(error) => Json(json!({
                "host": host,
                "success": false,
                "error": error.to_string(),
            }))
            .into_response(),
        },
        None => {
            // Map of host -> result, failed hosts included with their error
            let mut all = serde_json::Map::new();
            for host in state.registry.hosts() {
                let entry = match gpu_status(&state.registry, host).await {
                    Ok(report) => json!({ "success": true, "data": report }),
                    Err(error) => json!({ "success": false, "error": error.to_string() }),
                };
                all.insert(host.clone(), entry);
            }
            Json(serde_json::Value::Object(all)).into_response()
        }
    }
}

/// Whether the callback carries the expected shared secret.
fn authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|token| token == secret)
        .unwrap_or(false)
}

async fn approval_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !authorized(&headers, state.config.chat_secret.as_deref()) {
        tracing::warn!("Rejected approval callback with bad or missing token");
        return StatusCode::FORBIDDEN.into_response();
    }

    let event: ApprovalEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(%error, "Rejected malformed approval event");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if event.event_type != APPROVAL_EVENT_TYPE {
        tracing::debug!(event_type = %event.event_type, "Ignoring unrelated event");
        return Json(json!({ "status": "ignored" })).into_response();
    }

    let Some(instance) = event.process_instance else {
        tracing::warn!("Approval event without a process instance");
        return StatusCode::BAD_REQUEST.into_response();
    };

    if instance.status != COMPLETED_STATUS {
        tracing::debug!(status = %instance.status, "Ignoring unfinished approval instance");
        return Json(json!({ "status": "ignored" })).into_response();
    }

    let spec = match vm_spec_from_form(&instance) {
        Ok(spec) => spec,
        Err(error) => {
            tracing::warn!(%error, "Rejected approval form");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "rejected", "error": error.to_string() })),
            )
                .into_response();
        }
    };

    match provision_vm(&state.registry, &spec).await {
        Ok(message) => {
            state
                .notifier
                .send_text(&format!("VM creation succeeded: {message}"))
                .await;
            Json(json!({ "status": "completed", "message": message })).into_response()
        }
        Err(error) => {
            state
                .notifier
                .send_text(&format!("VM creation failed: {error}"))
                .await;
            Json(json!({ "status": "failed", "error": error.to_string() })).into_response()
        }
    }
}

/// Start the REST API server; runs until the shutdown future resolves.
pub async fn serve(
    state: Arc<AppState>,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let router = build_router(state);

    tracing::info!(%addr, "Starting REST API server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
