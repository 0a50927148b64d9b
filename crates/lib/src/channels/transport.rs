//! Transport contract consumed by the responder.
//!
//! The concrete messaging stack lives behind this trait; the responder only
//! needs conversation classification, a bounded history fetch, a read
//! receipt, and a single send call.

use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bridge request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("bridge api error: {0}")]
    Api(String),
    #[error("transport not configured: {0}")]
    NotConfigured(&'static str),
}

/// What kind of conversation an identifier refers to. Group and broadcast
/// conversations are never answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Direct,
    Group,
    Broadcast,
}

/// One item of authoritative conversation history. The responder only looks
/// at direction, attachment flag, and timestamp; everything else is opaque.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(default)]
    pub sender_is_self: bool,
    #[serde(default)]
    pub has_attachment: bool,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Abstract messaging transport (e.g. the HTTP message bridge).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Classify a conversation id.
    async fn conversation_kind(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationKind, TransportError>;

    /// Fetch up to `limit` recent items from the authoritative history.
    async fn fetch_recent_history(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryItem>, TransportError>;

    /// Mark the conversation as read. Best-effort; callers ignore failures.
    async fn acknowledge_read(&self, conversation_id: &str) -> Result<(), TransportError>;

    /// Send one text message to the conversation.
    async fn send_message(&self, conversation_id: &str, text: &str)
        -> Result<(), TransportError>;
}
