//! Gateway HTTP server: health endpoints and the bridge webhook.

use crate::channels::{InboundEvent, Transport};
use crate::config::{self, Config};
use crate::forward;
use crate::responder::Responder;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared state for the gateway routes.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Sender for inbound webhook events; the responder task receives.
    pub inbound_tx: mpsc::Sender<InboundEvent>,
    webhook_secret: Option<String>,
}

/// Webhook payload from the message bridge. Events without a timestamp are
/// stamped on receipt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookMessage {
    conversation_id: String,
    #[serde(default)]
    sender_is_self: bool,
    #[serde(default)]
    has_attachment: bool,
    #[serde(default)]
    timestamp_ms: Option<i64>,
}

/// Run the gateway; binds to config.gateway.bind:config.gateway.port and
/// blocks until shutdown (Ctrl+C or SIGTERM). Inbound webhook events flow
/// through an mpsc channel into the responder.
pub async fn run_gateway(config: Config, transport: Arc<dyn Transport>) -> Result<()> {
    config.validate()?;
    let responder = Responder::new(config.responder.clone(), transport);

    if let Some(url) = config::resolve_forward_url(&config) {
        let token = config::resolve_forward_token(&config);
        forward::spawn_forwarder(url, token, responder.subscribe());
    }

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundEvent>(64);
    {
        let responder = responder.clone();
        tokio::spawn(async move {
            while let Some(event) = inbound_rx.recv().await {
                responder.on_inbound(event).await;
            }
        });
    }

    let state = GatewayState {
        webhook_secret: config::resolve_webhook_secret(&config),
        config: Arc::new(config),
        inbound_tx,
    };

    let app = Router::new()
        .route("/", get(health_http))
        .route("/health", get(health_plain))
        .route("/webhook/message", post(webhook_message))
        .with_state(state.clone());

    let bind_addr = format!(
        "{}:{}",
        state.config.gateway.bind.trim(),
        state.config.gateway.port
    );
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// GET / returns runtime health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

/// GET /health returns a minimal ok body.
async fn health_plain() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /webhook/message — the bridge delivers one inbound message event;
/// verifies the optional shared secret, normalizes, and queues for the
/// responder.
async fn webhook_message(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref expected) = state.webhook_secret {
        let provided = headers
            .get("X-Webhook-Secret")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != expected.as_str() {
            return StatusCode::FORBIDDEN;
        }
    }
    let msg: WebhookMessage = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(_) => return StatusCode::BAD_REQUEST,
    };
    if msg.conversation_id.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    let event = InboundEvent {
        conversation_id: msg.conversation_id,
        sender_is_self: msg.sender_is_self,
        has_attachment: msg.has_attachment,
        timestamp_ms: msg
            .timestamp_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
    };
    if state.inbound_tx.send(event).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}
