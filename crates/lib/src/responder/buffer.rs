//! Per-conversation burst buffers and the store that owns them.
//!
//! A buffer entry exists exactly while at least one inbound message is
//! waiting for a reply. The entry owns the single pending settlement timer;
//! rearming aborts the previous one atomically with the field merge, so no
//! two settlement evaluations for the same conversation can be live at once.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct ConversationBuffer {
    /// Latched true when any message in the burst carried an attachment;
    /// never reset while the entry exists.
    has_attachment: bool,
    /// Newest inbound timestamp observed, by live event or reconciliation.
    last_inbound_at_ms: i64,
    /// The pending settlement task, if armed.
    timer: Option<JoinHandle<()>>,
}

/// Outcome of the settlement-time check against the store.
#[derive(Debug, PartialEq, Eq)]
pub enum Reconcile {
    /// Entry already gone (settled or discarded elsewhere). Benign.
    Gone,
    /// The store moved past the caller's snapshot; a newer timer owns the
    /// burst and this evaluation must stand down.
    Superseded,
    /// History revealed newer inbound activity; fields merged, caller rearms.
    Extended { last_inbound_at_ms: i64 },
    /// Burst is quiet; entry removed, classification latched.
    Settled { has_attachment: bool },
}

/// Concurrency-safe map of conversation id to burst buffer. Critical
/// sections never await, which linearizes all per-key transitions even on a
/// multi-threaded runtime.
#[derive(Default)]
pub struct BufferStore {
    inner: Mutex<HashMap<String, ConversationBuffer>>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ConversationBuffer>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or merge the buffer for one inbound message, aborting any
    /// pending timer so the caller can arm a fresh one. Returns
    /// `(created, last_inbound_at_ms)` after the merge.
    pub fn merge_inbound(
        &self,
        conversation_id: &str,
        timestamp_ms: i64,
        has_attachment: bool,
    ) -> (bool, i64) {
        let mut map = self.lock();
        match map.get_mut(conversation_id) {
            Some(entry) => {
                entry.has_attachment |= has_attachment;
                entry.last_inbound_at_ms = entry.last_inbound_at_ms.max(timestamp_ms);
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
                (false, entry.last_inbound_at_ms)
            }
            None => {
                map.insert(
                    conversation_id.to_string(),
                    ConversationBuffer {
                        has_attachment,
                        last_inbound_at_ms: timestamp_ms,
                        timer: None,
                    },
                );
                (true, timestamp_ms)
            }
        }
    }

    /// Store the new settlement timer, aborting any previous one. If the
    /// entry vanished in between, the orphan task is aborted instead.
    pub fn set_timer(&self, conversation_id: &str, handle: JoinHandle<()>) {
        let mut map = self.lock();
        match map.get_mut(conversation_id) {
            Some(entry) => {
                if let Some(old) = entry.timer.replace(handle) {
                    old.abort();
                }
            }
            None => handle.abort(),
        }
    }

    /// Current `(has_attachment, last_inbound_at_ms)` for the conversation.
    pub fn snapshot(&self, conversation_id: &str) -> Option<(bool, i64)> {
        self.lock()
            .get(conversation_id)
            .map(|e| (e.has_attachment, e.last_inbound_at_ms))
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.lock().contains_key(conversation_id)
    }

    /// Settlement-time check-and-act, atomic with respect to concurrent
    /// merges. `snapshot_last_ms` is what the evaluator saw before its
    /// history fetch; `newest_seen_ms`/`new_attachment` summarize strictly
    /// newer inbound items found in that fetch.
    pub fn reconcile(
        &self,
        conversation_id: &str,
        snapshot_last_ms: i64,
        newest_seen_ms: i64,
        new_attachment: bool,
    ) -> Reconcile {
        let mut map = self.lock();
        match map.get_mut(conversation_id) {
            None => Reconcile::Gone,
            Some(entry) if entry.last_inbound_at_ms > snapshot_last_ms => Reconcile::Superseded,
            Some(entry) if newest_seen_ms > entry.last_inbound_at_ms => {
                entry.last_inbound_at_ms = newest_seen_ms;
                entry.has_attachment |= new_attachment;
                Reconcile::Extended {
                    last_inbound_at_ms: newest_seen_ms,
                }
            }
            Some(_) => match map.remove(conversation_id) {
                // Dropping the removed entry detaches its timer handle (our
                // own task) rather than aborting it.
                Some(entry) => Reconcile::Settled {
                    has_attachment: entry.has_attachment,
                },
                None => Reconcile::Gone,
            },
        }
    }

    /// Drop an entry without dispatch (group/broadcast conversations).
    pub fn discard(&self, conversation_id: &str) -> bool {
        match self.lock().remove(conversation_id) {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                true
            }
            None => false,
        }
    }
}
