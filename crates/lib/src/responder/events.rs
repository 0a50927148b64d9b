//! Burst lifecycle events for external observers (logging, forwarding).

use serde::Serialize;

/// One-way notifications about burst state changes. Subscribers may lag or
/// drop; the responder never depends on delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BurstEvent {
    /// First inbound message of a burst created a buffer entry.
    Created {
        conversation_id: String,
        has_attachment: bool,
    },
    /// The quiet-window countdown was restarted (live event or newer history).
    Extended {
        conversation_id: String,
        last_inbound_at_ms: i64,
    },
    /// The burst settled and exactly one reply was sent.
    Settled {
        conversation_id: String,
        has_attachment: bool,
    },
    /// The buffer was dropped without a reply.
    Discarded {
        conversation_id: String,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_tagged_camel_case() {
        let event = BurstEvent::Settled {
            conversation_id: "c1".to_string(),
            has_attachment: true,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "settled");
        assert_eq!(json["conversationId"], "c1");
        assert_eq!(json["hasAttachment"], true);
    }
}
