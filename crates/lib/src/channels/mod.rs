//! Messaging-side seams.
//!
//! The responder never talks to the concrete messaging stack directly; it
//! consumes the `Transport` contract, normalized `InboundEvent`s, and a cheap
//! id gate for broadcast pseudo-conversations.

mod bridge;
mod gating;
mod inbound;
mod transport;

pub use bridge::BridgeTransport;
pub use gating::is_broadcast_conversation;
pub use inbound::InboundEvent;
pub use transport::{ConversationKind, HistoryItem, Transport, TransportError};
