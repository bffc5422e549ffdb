//! Typed domain event dispatcher.
//!
//! A closed set of event variants, each with a strongly typed serializable
//! payload, so the same value flows through the in-session bus and the
//! persisted cross-session relay slot. Delivery within a session is synchronous and in emission
//! order; nothing beyond per-session causal order is guaranteed across
//! sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::models::{Incident, Notification, Patient};
use crate::reconcile::SyncDiff;

/// Everything that can happen to clinic data. Serialized form matches the
/// relay slot layout: `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum DomainEvent {
    PatientAdded { patient: Patient },
    PatientUpdated { patient: Patient },
    PatientDeleted { patient_id: String },
    AppointmentAdded { incident: Incident },
    AppointmentUpdated { incident: Incident },
    AppointmentDeleted { incident: Incident },
    PaymentProcessed {
        incident_id: String,
        patient_id: String,
        amount: f64,
    },
    NotificationCreated { notification: Notification },
    DataSynchronized { diff: SyncDiff },
}

impl DomainEvent {
    /// Wire name of the variant, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PatientAdded { .. } => "patientAdded",
            Self::PatientUpdated { .. } => "patientUpdated",
            Self::PatientDeleted { .. } => "patientDeleted",
            Self::AppointmentAdded { .. } => "appointmentAdded",
            Self::AppointmentUpdated { .. } => "appointmentUpdated",
            Self::AppointmentDeleted { .. } => "appointmentDeleted",
            Self::PaymentProcessed { .. } => "paymentProcessed",
            Self::NotificationCreated { .. } => "notificationCreated",
            Self::DataSynchronized { .. } => "dataSynchronized",
        }
    }

    /// Whether receiving this event from another session should trigger a
    /// wholesale re-read of patient/incident state.
    pub fn changes_clinic_data(&self) -> bool {
        matches!(
            self,
            Self::PatientAdded { .. }
                | Self::PatientUpdated { .. }
                | Self::PatientDeleted { .. }
                | Self::AppointmentAdded { .. }
                | Self::AppointmentUpdated { .. }
                | Self::AppointmentDeleted { .. }
                | Self::PaymentProcessed { .. }
        )
    }
}

type Handler = Arc<dyn Fn(&DomainEvent) + Send + Sync>;

struct BusInner {
    handlers: Mutex<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

/// Per-session synchronous pub/sub. Cloning shares the subscriber list.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                handlers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a handler. Dropping the returned subscription unregisters it.
    pub fn subscribe(
        &self,
        handler: impl Fn(&DomainEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.inner.handlers.lock() {
            handlers.push((id, Arc::new(handler)));
        }
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers to all current subscribers on the calling thread, in
    /// registration order. Handlers run outside the subscriber lock, so they
    /// may subscribe or emit further events.
    pub fn emit(&self, event: &DomainEvent) {
        tracing::debug!(event = event.name(), "Dispatching domain event");
        let handlers: Vec<Handler> = match self.inner.handlers.lock() {
            Ok(handlers) => handlers.iter().map(|(_, h)| h.clone()).collect(),
            Err(_) => return,
        };
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }
}

/// Keeps a bus handler registered for its lifetime.
pub struct Subscription {
    bus: Weak<BusInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if let Ok(mut handlers) = bus.handlers.lock() {
                handlers.retain(|(handler_id, _)| *handler_id != self.id);
            }
        }
    }
}
