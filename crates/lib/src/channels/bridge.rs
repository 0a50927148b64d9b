//! HTTP message bridge transport: chat metadata, history, read receipts, and
//! sends via the bridge REST API.

use crate::channels::transport::{ConversationKind, HistoryItem, Transport, TransportError};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatInfoResponse {
    #[serde(default)]
    kind: String,
}

/// Transport backed by a message bridge REST API (base URL + bearer token).
#[derive(Clone)]
pub struct BridgeTransport {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl BridgeTransport {
    pub fn new(base_url: String, api_token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client: reqwest::Client::new(),
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TransportError::Api(format!("{} {}", status, body)));
        }
        Ok(res)
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    /// GET /chats/{id} — chat metadata; `kind` is "direct", "group", or "broadcast".
    async fn conversation_kind(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationKind, TransportError> {
        let url = format!("{}/chats/{}", self.base_url, conversation_id);
        let res = self.auth(self.client.get(&url)).send().await?;
        let res = Self::check(res).await?;
        let info: ChatInfoResponse = res.json().await?;
        let kind = match info.kind.trim().to_lowercase().as_str() {
            "group" => ConversationKind::Group,
            "broadcast" | "status" => ConversationKind::Broadcast,
            _ => ConversationKind::Direct,
        };
        Ok(kind)
    }

    /// GET /chats/{id}/messages?limit=N — recent history, any order.
    async fn fetch_recent_history(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryItem>, TransportError> {
        let url = format!(
            "{}/chats/{}/messages?limit={}",
            self.base_url, conversation_id, limit
        );
        let res = self.auth(self.client.get(&url)).send().await?;
        let res = Self::check(res).await?;
        let items: Vec<HistoryItem> = res.json().await?;
        Ok(items)
    }

    /// POST /chats/{id}/read — mark the conversation as read.
    async fn acknowledge_read(&self, conversation_id: &str) -> Result<(), TransportError> {
        let url = format!("{}/chats/{}/read", self.base_url, conversation_id);
        let res = self.auth(self.client.post(&url)).send().await?;
        Self::check(res).await?;
        Ok(())
    }

    /// POST /chats/{id}/messages — send one text message.
    async fn send_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), TransportError> {
        let url = format!("{}/chats/{}/messages", self.base_url, conversation_id);
        let body = serde_json::json!({ "text": text });
        let res = self.auth(self.client.post(&url).json(&body)).send().await?;
        Self::check(res).await?;
        Ok(())
    }
}
