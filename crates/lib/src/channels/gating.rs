//! Cheap conversation-id gating, ahead of the async classifier.

/// True for broadcast/status pseudo-conversations (e.g. `status@broadcast`).
/// These never receive replies and never get a buffer entry.
pub fn is_broadcast_conversation(conversation_id: &str) -> bool {
    conversation_id.trim().ends_with("@broadcast")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_broadcast_is_gated() {
        assert!(is_broadcast_conversation("status@broadcast"));
    }

    #[test]
    fn list_broadcast_is_gated() {
        assert!(is_broadcast_conversation("123456789@broadcast"));
    }

    #[test]
    fn direct_conversation_passes() {
        assert!(!is_broadcast_conversation("5511999999999@c.us"));
        assert!(!is_broadcast_conversation("alice"));
    }
}
