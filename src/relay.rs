//! Cross-session event relay.
//!
//! One publish call serves both delivery paths: the event is emitted on the
//! publishing session's local bus, then persisted as a [`RelayEnvelope`]
//! under the `lastCrossSessionEvent` key. Other sessions observe that key
//! change through their storage watcher, decode the envelope, and re-emit the
//! event on their own bus. Receivers treat relayed events as facts — they
//! refresh or absorb, never re-publish — so an event crosses the relay slot
//! exactly once.
//!
//! The slot is last-write-wins: two sessions racing to publish may overwrite
//! each other, and a session that was closed while an event fired only
//! catches up via reconciliation. Both are accepted.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::{DomainEvent, EventBus};
use crate::store::{ChangeNotice, DataStore, SessionId, StoreKey};

/// Persisted relay value: `{type, data, timestamp, origin}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEnvelope {
    #[serde(flatten)]
    pub event: DomainEvent,
    /// Publish instant, unix milliseconds.
    pub timestamp: i64,
    pub origin: SessionId,
}

/// Publishes domain events to the local bus and the cross-session slot.
pub struct CrossSessionRelay {
    bus: EventBus,
    store: Arc<DataStore>,
}

impl CrossSessionRelay {
    pub fn new(bus: EventBus, store: Arc<DataStore>) -> Arc<Self> {
        Arc::new(Self { bus, store })
    }

    /// Local emit first (same-session delivery is synchronous), then the
    /// persisted fanout. A storage failure degrades to local-only delivery;
    /// the reconciliation loop covers the other sessions eventually.
    pub fn publish(&self, event: DomainEvent) {
        self.bus.emit(&event);
        let envelope = RelayEnvelope {
            event,
            timestamp: Utc::now().timestamp_millis(),
            origin: self.store.session_id(),
        };
        if !self.store.set(StoreKey::RelayEvent, &envelope) {
            tracing::warn!(
                event = envelope.event.name(),
                "Relay slot write failed, event delivered locally only"
            );
        }
    }

    /// Decodes a relay-slot change from another session. Returns `None` for
    /// this session's own writes, non-relay keys, removals, and corrupt
    /// envelopes (logged and dropped).
    pub fn decode(&self, notice: &ChangeNotice) -> Option<DomainEvent> {
        if notice.key != StoreKey::RelayEvent.as_str() || notice.origin == self.store.session_id() {
            return None;
        }
        let raw = notice.new_value.as_deref()?;
        match serde_json::from_str::<RelayEnvelope>(raw) {
            Ok(envelope) => Some(envelope.event),
            Err(e) => {
                tracing::error!(error = %e, "Corrupt cross-session event envelope dropped");
                None
            }
        }
    }
}
