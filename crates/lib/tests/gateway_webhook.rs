//! Integration test: start the gateway on a free port with a stub transport,
//! exercise the health routes and the webhook, and drive one burst end to end.
//! Does not require a running message bridge. Server tasks are left running
//! when a test ends.

use async_trait::async_trait;
use lib::channels::{ConversationKind, HistoryItem, Transport, TransportError};
use lib::config::Config;
use lib::gateway;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Always-direct transport that records outgoing replies.
#[derive(Default)]
struct StubTransport {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Transport for StubTransport {
    async fn conversation_kind(
        &self,
        _conversation_id: &str,
    ) -> Result<ConversationKind, TransportError> {
        Ok(ConversationKind::Direct)
    }

    async fn fetch_recent_history(
        &self,
        _conversation_id: &str,
        _limit: u32,
    ) -> Result<Vec<HistoryItem>, TransportError> {
        Ok(Vec::new())
    }

    async fn acknowledge_read(&self, _conversation_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("sent")
            .push((conversation_id.to_string(), text.to_string()));
        Ok(())
    }
}

async fn start_gateway(config: Config, transport: Arc<StubTransport>) -> String {
    let port = config.gateway.port;
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config, transport).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let url = format!("{}/", base);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway did not come up on {} within 5s", base);
}

#[tokio::test]
async fn gateway_health_routes_respond() {
    let mut config = Config::default();
    config.gateway.port = free_port();
    let port = config.gateway.port;
    let base = start_gateway(config, Arc::new(StubTransport::default())).await;

    let client = reqwest::Client::new();
    let json: serde_json::Value = client
        .get(format!("{}/", base))
        .send()
        .await
        .expect("GET /")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
    assert_eq!(json.get("port").and_then(|v| v.as_u64()), Some(port as u64));

    let json: serde_json::Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("GET /health")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn webhook_rejects_bad_secret_and_bad_payloads() {
    let mut config = Config::default();
    config.gateway.port = free_port();
    config.gateway.webhook_secret = Some("s3cret".to_string());
    let base = start_gateway(config, Arc::new(StubTransport::default())).await;
    let url = format!("{}/webhook/message", base);
    let client = reqwest::Client::new();

    // Missing secret.
    let resp = client
        .post(&url)
        .json(&serde_json::json!({ "conversationId": "c1" }))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

    // Wrong secret.
    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", "nope")
        .json(&serde_json::json!({ "conversationId": "c1" }))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

    // Invalid JSON.
    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", "s3cret")
        .body("not json")
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    // Empty conversation id.
    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", "s3cret")
        .json(&serde_json::json!({ "conversationId": "  " }))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    // Well-formed event with the right secret is accepted.
    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", "s3cret")
        .json(&serde_json::json!({ "conversationId": "c1", "hasAttachment": false }))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn webhook_event_flows_through_to_one_reply() {
    let mut config = Config::default();
    config.gateway.port = free_port();
    config.responder.debounce_ms = 50;
    let transport = Arc::new(StubTransport::default());
    let base = start_gateway(config, transport.clone()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/webhook/message", base))
        .json(&serde_json::json!({ "conversationId": "c1" }))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    for _ in 0..100 {
        if !transport.sent.lock().expect("sent").is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let sent = transport.sent.lock().expect("sent").clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "c1");
    assert_eq!(
        sent[0].1,
        lib::config::ResponderConfig::default().reply.solicitation
    );
}
