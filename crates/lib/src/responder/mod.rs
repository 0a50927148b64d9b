//! The responder core: debounce scheduling and burst settlement.
//!
//! Each inbound message creates (or extends) a per-conversation buffer and
//! arms a settlement timer for the full quiet window. When a timer fires,
//! the evaluator re-checks the authoritative history; anything newer extends
//! the burst instead of answering it. A settled burst gets exactly one
//! canned reply, and the buffer is removed before the send, so replies are
//! at-most-once per burst.

mod buffer;
mod events;
mod reply;

pub use events::BurstEvent;

use crate::channels::{is_broadcast_conversation, ConversationKind, InboundEvent, Transport};
use crate::config::ResponderConfig;
use buffer::{BufferStore, Reconcile};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;

/// Capacity of the lifecycle event channel; slow subscribers lag, never block.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Debounced single-reply responder for one messaging account.
pub struct Responder {
    config: ResponderConfig,
    transport: Arc<dyn Transport>,
    store: BufferStore,
    events: broadcast::Sender<BurstEvent>,
    /// Self-handle so armed timers can call back into the responder.
    weak: Weak<Responder>,
}

impl Responder {
    pub fn new(config: ResponderConfig, transport: Arc<dyn Transport>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new_cyclic(|weak| Self {
            config,
            transport,
            store: BufferStore::new(),
            events,
            weak: weak.clone(),
        })
    }

    /// Subscribe to burst lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<BurstEvent> {
        self.events.subscribe()
    }

    /// True while the conversation has an unanswered burst pending.
    pub fn has_pending(&self, conversation_id: &str) -> bool {
        self.store.contains(conversation_id)
    }

    /// Handle one inbound message event: merge it into the conversation's
    /// buffer and restart the quiet-window countdown. Messages from this
    /// account and group or broadcast conversations never create state.
    pub async fn on_inbound(&self, event: InboundEvent) {
        if event.sender_is_self {
            return;
        }
        if is_broadcast_conversation(&event.conversation_id) {
            log::debug!("ignoring broadcast conversation {}", event.conversation_id);
            return;
        }
        // Classify before the first buffer entry; later events for a live
        // burst skip the round-trip.
        if !self.store.contains(&event.conversation_id) {
            match self.transport.conversation_kind(&event.conversation_id).await {
                Ok(ConversationKind::Direct) => {}
                Ok(kind) => {
                    log::debug!(
                        "ignoring {:?} conversation {}",
                        kind,
                        event.conversation_id
                    );
                    return;
                }
                Err(e) => {
                    log::warn!(
                        "could not classify conversation {}, dropping event: {}",
                        event.conversation_id,
                        e
                    );
                    return;
                }
            }
        }
        let (created, last_inbound_at_ms) = self.store.merge_inbound(
            &event.conversation_id,
            event.timestamp_ms,
            event.has_attachment,
        );
        if created {
            log::info!(
                "burst started for {} (attachment: {})",
                event.conversation_id,
                event.has_attachment
            );
            let _ = self.events.send(BurstEvent::Created {
                conversation_id: event.conversation_id.clone(),
                has_attachment: event.has_attachment,
            });
        } else {
            let _ = self.events.send(BurstEvent::Extended {
                conversation_id: event.conversation_id.clone(),
                last_inbound_at_ms,
            });
        }
        self.arm(&event.conversation_id);
    }

    /// Arm (or rearm) the settlement timer: the full quiet window, measured
    /// from now. The stored handle is the burst's only pending timer.
    fn arm(&self, conversation_id: &str) {
        let Some(responder) = self.weak.upgrade() else {
            return;
        };
        let id = conversation_id.to_string();
        let window = Duration::from_millis(self.config.debounce_ms);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            responder.settle(&id).await;
        });
        self.store.set_timer(conversation_id, handle);
    }

    /// Evaluate whether the burst has settled. Runs when a timer elapses
    /// without being cancelled by new activity.
    async fn settle(&self, conversation_id: &str) {
        // Absent entry: already settled or discarded by another path.
        let Some((_, snapshot_last_ms)) = self.store.snapshot(conversation_id) else {
            return;
        };

        // Defensive recheck: a non-direct conversation is never answered even
        // if an entry slipped in. Classification failure is no new
        // information; evaluate with what the buffer knows.
        match self.transport.conversation_kind(conversation_id).await {
            Ok(ConversationKind::Direct) => {}
            Ok(_) => {
                self.store.discard(conversation_id);
                log::info!(
                    "discarding burst for non-direct conversation {}",
                    conversation_id
                );
                let _ = self.events.send(BurstEvent::Discarded {
                    conversation_id: conversation_id.to_string(),
                    reason: "group-or-broadcast",
                });
                return;
            }
            Err(e) => {
                log::debug!(
                    "classification recheck failed for {}: {}",
                    conversation_id,
                    e
                );
            }
        }

        // Fetch failures degrade to "nothing newer" rather than failing the
        // evaluation.
        let history = match self
            .transport
            .fetch_recent_history(conversation_id, self.config.fetch_limit)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                log::debug!("history fetch failed for {}: {}", conversation_id, e);
                Vec::new()
            }
        };

        let mut newest_seen_ms = snapshot_last_ms;
        let mut new_attachment = false;
        for item in &history {
            if item.sender_is_self || item.timestamp_ms <= snapshot_last_ms {
                continue;
            }
            newest_seen_ms = newest_seen_ms.max(item.timestamp_ms);
            new_attachment |= item.has_attachment;
        }

        match self.store.reconcile(
            conversation_id,
            snapshot_last_ms,
            newest_seen_ms,
            new_attachment,
        ) {
            Reconcile::Gone | Reconcile::Superseded => {}
            Reconcile::Extended { last_inbound_at_ms } => {
                log::debug!(
                    "history shows newer activity for {} ({}), extending burst",
                    conversation_id,
                    last_inbound_at_ms
                );
                let _ = self.events.send(BurstEvent::Extended {
                    conversation_id: conversation_id.to_string(),
                    last_inbound_at_ms,
                });
                self.arm(conversation_id);
            }
            Reconcile::Settled { has_attachment } => {
                self.dispatch(conversation_id, has_attachment).await;
            }
        }
    }

    /// Send the single reply for a settled burst. The buffer entry is gone
    /// by now, so a failed send is logged and the burst is lost; retrying
    /// would risk answering a conversation whose state has moved on.
    async fn dispatch(&self, conversation_id: &str, has_attachment: bool) {
        if let Err(e) = self.transport.acknowledge_read(conversation_id).await {
            log::debug!("read acknowledgment failed for {}: {}", conversation_id, e);
        }
        let text = reply::select_template(&self.config.reply, has_attachment);
        match self.transport.send_message(conversation_id, text).await {
            Ok(()) => {
                log::info!(
                    "replied to {} (attachment: {})",
                    conversation_id,
                    has_attachment
                );
                let _ = self.events.send(BurstEvent::Settled {
                    conversation_id: conversation_id.to_string(),
                    has_attachment,
                });
            }
            Err(e) => {
                log::error!(
                    "reply to {} failed, burst dropped without retry: {}",
                    conversation_id,
                    e
                );
            }
        }
    }
}
