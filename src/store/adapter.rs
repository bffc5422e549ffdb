//! Per-session typed storage adapter.
//!
//! `DataStore` is the only persistence surface application code sees. Writes
//! report success as a boolean and never panic; reads substitute the caller's
//! default on any failure. Each successful mutation emits a local
//! [`StoreSignal`] to this session's listeners (the save-status feed) in
//! addition to the cross-session change fanout done by `SharedStorage`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::shared::{SessionId, SharedStorage};
use super::StoreKey;

/// Outcome category of a storage mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSignalKind {
    Stored,
    Removed,
    Cleared,
    Failed,
}

/// Save-status signal, delivered synchronously within the owning session.
#[derive(Debug, Clone)]
pub struct StoreSignal {
    /// `None` for whole-store operations (clear).
    pub key: Option<StoreKey>,
    pub kind: StoreSignalKind,
    pub timestamp: String,
    /// Failure description when `kind == Failed`.
    pub error: Option<String>,
}

impl StoreSignal {
    pub fn succeeded(&self) -> bool {
        self.kind != StoreSignalKind::Failed
    }
}

type SignalFn = Arc<dyn Fn(&StoreSignal) + Send + Sync>;

/// Typed facade over [`SharedStorage`] bound to one session.
pub struct DataStore {
    shared: Arc<SharedStorage>,
    session: SessionId,
    listeners: Mutex<Vec<(u64, SignalFn)>>,
    next_listener_id: AtomicU64,
}

impl DataStore {
    pub fn new(shared: Arc<SharedStorage>) -> Arc<Self> {
        Self::for_session(shared, Uuid::new_v4())
    }

    pub fn for_session(shared: Arc<SharedStorage>, session: SessionId) -> Arc<Self> {
        Arc::new(Self {
            shared,
            session,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn shared(&self) -> &Arc<SharedStorage> {
        &self.shared
    }

    /// Serializes and stores a value. Returns `false` (and emits a failed
    /// signal) on serialization or storage failure; callers degrade to their
    /// last known in-memory state rather than retrying.
    pub fn set<T: Serialize>(&self, key: StoreKey, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to serialize value for store");
                self.emit_signal(Some(key), StoreSignalKind::Failed, Some(e.to_string()));
                return false;
            }
        };
        match self.shared.set_raw(key.as_str(), &raw, self.session) {
            Ok(()) => {
                self.emit_signal(Some(key), StoreSignalKind::Stored, None);
                true
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to save to store");
                self.emit_signal(Some(key), StoreSignalKind::Failed, Some(e.to_string()));
                false
            }
        }
    }

    /// Reads and deserializes a value. Never fails: a missing key returns the
    /// default unchanged, malformed stored data is logged and replaced by the
    /// default.
    pub fn get<T: DeserializeOwned>(&self, key: StoreKey, default: T) -> T {
        match self.shared.get_raw(key.as_str()) {
            None => default,
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Malformed stored data, using default");
                    default
                }
            },
        }
    }

    pub fn remove(&self, key: StoreKey) -> bool {
        match self.shared.remove_raw(key.as_str(), self.session) {
            Ok(_) => {
                self.emit_signal(Some(key), StoreSignalKind::Removed, None);
                true
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to remove from store");
                self.emit_signal(Some(key), StoreSignalKind::Failed, Some(e.to_string()));
                false
            }
        }
    }

    pub fn clear(&self) -> bool {
        match self.shared.clear_raw(self.session) {
            Ok(()) => {
                self.emit_signal(None, StoreSignalKind::Cleared, None);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to clear store");
                self.emit_signal(None, StoreSignalKind::Failed, Some(e.to_string()));
                false
            }
        }
    }

    /// Registers a save-status listener for this session. Dropping the guard
    /// unregisters it.
    pub fn on_signal(
        self: &Arc<Self>,
        listener: impl Fn(&StoreSignal) + Send + Sync + 'static,
    ) -> SignalGuard {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        SignalGuard {
            store: Arc::downgrade(self),
            id,
        }
    }

    fn emit_signal(&self, key: Option<StoreKey>, kind: StoreSignalKind, error: Option<String>) {
        let signal = StoreSignal {
            key,
            kind,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            error,
        };
        let listeners: Vec<SignalFn> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(&signal);
        }
    }

    fn remove_listener(&self, id: u64) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }
}

/// Keeps a save-status listener registered for its lifetime.
pub struct SignalGuard {
    store: Weak<DataStore>,
    id: u64,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.remove_listener(self.id);
        }
    }
}
