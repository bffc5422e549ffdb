//! Periodic reconciliation against the shared store.
//!
//! Change notices cover the live path; this loop is the safety net for
//! anything a session missed — an overwritten relay slot, a watcher that
//! raced a write, or state mutated while the session was detached. Every
//! cycle compares the session's in-memory snapshot against what the store
//! holds and, on divergence, replaces the snapshot wholesale and emits a
//! `dataSynchronized` event on the local bus only. Sync events never enter
//! the relay slot, so reconciliation can never feed back into itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clinic::ClinicService;
use crate::config::{RECONCILE_INTERVAL_MS, RECONCILE_SLEEP_GRANULARITY_MS};
use crate::events::{DomainEvent, EventBus};
use crate::models::{Incident, Notification, Patient};
use crate::notifications::{visible_to, NotificationStore};
use crate::store::{DataStore, StoreKey};

/// Which collections a reconciliation pass replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDiff {
    pub patients_changed: bool,
    pub incidents_changed: bool,
    pub notifications_changed: bool,
}

impl SyncDiff {
    pub fn any(&self) -> bool {
        self.patients_changed || self.incidents_changed || self.notifications_changed
    }
}

/// Compares one session's in-memory state against the store.
pub struct Reconciler {
    clinic: Arc<ClinicService>,
    notifications: Arc<NotificationStore>,
    store: Arc<DataStore>,
    bus: EventBus,
}

impl Reconciler {
    pub fn new(
        clinic: Arc<ClinicService>,
        notifications: Arc<NotificationStore>,
        store: Arc<DataStore>,
        bus: EventBus,
    ) -> Arc<Self> {
        Arc::new(Self {
            clinic,
            notifications,
            store,
            bus,
        })
    }

    /// One reconciliation pass. Divergent collections are replaced from the
    /// store (the store always wins) and the resulting diff is emitted as a
    /// local `dataSynchronized` event when anything changed.
    pub fn reconcile(&self) -> SyncDiff {
        let stored_patients: Vec<Patient> = self.store.get(StoreKey::Patients, Vec::new());
        let stored_incidents: Vec<Incident> = self.store.get(StoreKey::Incidents, Vec::new());
        let stored_notifications: Vec<Notification> =
            self.store.get(StoreKey::Notifications, Vec::new());

        let diff = SyncDiff {
            patients_changed: patients_diverged(&self.clinic.patients(), &stored_patients),
            incidents_changed: incidents_diverged(&self.clinic.incidents(), &stored_incidents),
            notifications_changed: notifications_diverged(
                &self.notifications.visible(),
                &stored_notifications,
                self.notifications.viewer(),
            ),
        };

        if diff.patients_changed || diff.incidents_changed {
            self.clinic.refresh();
        }
        if diff.notifications_changed {
            self.notifications.load();
        }
        if diff.any() {
            tracing::info!(
                patients = diff.patients_changed,
                incidents = diff.incidents_changed,
                notifications = diff.notifications_changed,
                "Reconciled session state from store"
            );
            self.bus.emit(&DomainEvent::DataSynchronized { diff });
        }
        diff
    }
}

fn patients_diverged(local: &[Patient], stored: &[Patient]) -> bool {
    local.len() != stored.len()
        || local
            .iter()
            .zip(stored)
            .any(|(a, b)| a.id != b.id || a.total_spent != b.total_spent)
}

fn incidents_diverged(local: &[Incident], stored: &[Incident]) -> bool {
    local.len() != stored.len()
        || local
            .iter()
            .zip(stored)
            .any(|(a, b)| a.id != b.id || a.status != b.status || a.is_paid != b.is_paid)
}

fn notifications_diverged(local: &[Notification], stored: &[Notification], viewer: &crate::notifications::Viewer) -> bool {
    let expected: Vec<&str> = stored
        .iter()
        .filter(|n| visible_to(n, viewer))
        .map(|n| n.id.as_str())
        .collect();
    let current: Vec<(&str, bool)> = local.iter().map(|n| (n.id.as_str(), n.is_read)).collect();
    expected.len() != current.len()
        || expected
            .iter()
            .zip(&current)
            .any(|(id, (local_id, _))| id != local_id)
        || stored
            .iter()
            .filter(|n| visible_to(n, viewer))
            .zip(&current)
            .any(|(n, (_, read))| n.is_read != *read)
}

/// Handle for the background reconciliation thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on `Drop`.
pub struct ReconcilerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Request graceful shutdown. A pass already in flight completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the periodic reconciliation loop on a separate thread.
pub fn start_reconciler(reconciler: Arc<Reconciler>) -> ReconcilerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            "Reconciliation loop started (every {}ms)",
            RECONCILE_INTERVAL_MS
        );
        reconcile_loop(&reconciler, &flag);
    });

    ReconcilerHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn reconcile_loop(reconciler: &Reconciler, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        // Sleep in small increments for responsive shutdown
        for _ in 0..(RECONCILE_INTERVAL_MS / RECONCILE_SLEEP_GRANULARITY_MS) {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("Reconciliation loop shutting down");
                return;
            }
            std::thread::sleep(Duration::from_millis(RECONCILE_SLEEP_GRANULARITY_MS));
        }

        reconciler.reconcile();
    }
    tracing::info!("Reconciliation loop shutting down");
}
