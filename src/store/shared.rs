//! Shared storage with cross-session change fanout.
//!
//! One `SharedStorage` is the single shared resource across all open
//! sessions: every session reads and writes through it. Each successful
//! mutation produces a [`ChangeNotice`] delivered synchronously to every
//! registered watcher, including the writer's own session. One symmetric
//! delivery model serves both local and foreign consumers; watchers filter
//! on `origin` when they only care about foreign changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use super::backend::{MemoryBackend, StorageBackend};
use super::StoreError;

/// Identifies one session (one "tab") against the shared storage.
pub type SessionId = Uuid;

/// Delivered to watchers after every successful mutation.
#[derive(Debug, Clone)]
pub struct ChangeNotice {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    pub old_value: Option<String>,
    /// Session that performed the write.
    pub origin: SessionId,
    pub timestamp: String,
}

type WatcherFn = Arc<dyn Fn(&ChangeNotice) + Send + Sync>;

/// The single shared resource across all sessions. No transactions, no
/// per-key locking discipline: concurrent writers are last-write-wins.
pub struct SharedStorage {
    backend: Mutex<Box<dyn StorageBackend>>,
    watchers: Mutex<Vec<(u64, WatcherFn)>>,
    next_watcher_id: AtomicU64,
}

impl SharedStorage {
    pub fn new(backend: impl StorageBackend + 'static) -> Arc<Self> {
        Arc::new(Self {
            backend: Mutex::new(Box::new(backend)),
            watchers: Mutex::new(Vec::new()),
            next_watcher_id: AtomicU64::new(1),
        })
    }

    pub fn in_memory() -> Arc<Self> {
        Self::new(MemoryBackend::new())
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.lock() {
            Ok(backend) => backend.get(key),
            Err(_) => {
                tracing::error!(key, "Storage lock poisoned on read");
                None
            }
        }
    }

    pub fn set_raw(&self, key: &str, value: &str, origin: SessionId) -> Result<(), StoreError> {
        let old_value = {
            let mut backend = self.backend.lock().map_err(|_| StoreError::LockPoisoned)?;
            let old = backend.get(key);
            backend.set(key, value)?;
            old
        };
        self.notify(ChangeNotice {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            old_value,
            origin,
            timestamp: now(),
        });
        Ok(())
    }

    pub fn remove_raw(&self, key: &str, origin: SessionId) -> Result<Option<String>, StoreError> {
        let old_value = {
            let mut backend = self.backend.lock().map_err(|_| StoreError::LockPoisoned)?;
            backend.remove(key)?
        };
        if old_value.is_some() {
            self.notify(ChangeNotice {
                key: key.to_string(),
                new_value: None,
                old_value: old_value.clone(),
                origin,
                timestamp: now(),
            });
        }
        Ok(old_value)
    }

    /// Clears every key, emitting one removal notice per key that was present.
    pub fn clear_raw(&self, origin: SessionId) -> Result<(), StoreError> {
        let removed = {
            let mut backend = self.backend.lock().map_err(|_| StoreError::LockPoisoned)?;
            let keys = backend.keys();
            let mut removed = Vec::with_capacity(keys.len());
            for key in &keys {
                if let Some(old) = backend.get(key) {
                    removed.push((key.clone(), old));
                }
            }
            backend.clear()?;
            removed
        };
        let timestamp = now();
        for (key, old_value) in removed {
            self.notify(ChangeNotice {
                key,
                new_value: None,
                old_value: Some(old_value),
                origin,
                timestamp: timestamp.clone(),
            });
        }
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        match self.backend.lock() {
            Ok(backend) => backend.keys(),
            Err(_) => Vec::new(),
        }
    }

    /// Total stored bytes (keys plus values).
    pub fn size_bytes(&self) -> usize {
        match self.backend.lock() {
            Ok(backend) => backend.size_bytes(),
            Err(_) => 0,
        }
    }

    /// Registers a change watcher. Dropping the guard unregisters it, so a
    /// torn-down session stops receiving notices.
    pub fn watch(
        self: &Arc<Self>,
        watcher: impl Fn(&ChangeNotice) + Send + Sync + 'static,
    ) -> WatcherGuard {
        let id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.push((id, Arc::new(watcher)));
        }
        WatcherGuard {
            storage: Arc::downgrade(self),
            id,
        }
    }

    /// Calls watchers outside the backend lock, in registration order, so a
    /// watcher may freely read (or write) the store.
    fn notify(&self, notice: ChangeNotice) {
        let watchers: Vec<WatcherFn> = match self.watchers.lock() {
            Ok(watchers) => watchers.iter().map(|(_, w)| w.clone()).collect(),
            Err(_) => return,
        };
        for watcher in watchers {
            watcher(&notice);
        }
    }

    fn unwatch(&self, id: u64) {
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.retain(|(watcher_id, _)| *watcher_id != id);
        }
    }
}

/// Keeps a storage watcher registered for its lifetime.
pub struct WatcherGuard {
    storage: Weak<SharedStorage>,
    id: u64,
}

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        if let Some(storage) = self.storage.upgrade() {
            storage.unwatch(self.id);
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
