//! Inbound message event: delivered by the gateway webhook to the responder.

/// One inbound message observation for a conversation.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Opaque stable identifier of the remote party's conversation.
    pub conversation_id: String,
    /// True when the message was sent by this account (never answered).
    pub sender_is_self: bool,
    /// True when the message carries a non-text payload.
    pub has_attachment: bool,
    /// Epoch milliseconds of the message.
    pub timestamp_ms: i64,
}
