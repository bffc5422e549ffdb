//! Role-scoped notification store.
//!
//! Holds one session's visible notification list, synchronized with the
//! unfiltered persisted collection. Creation always goes through the relay so
//! the originating session toasts immediately and other sessions absorb the
//! fact; every other mutation writes both the visible list and the persisted
//! collection.

use std::sync::{Arc, Mutex};

use crate::models::{Notification, NotificationDraft, NotificationKind, Role, User};
use crate::relay::CrossSessionRelay;
use crate::store::{DataStore, StoreKey};
use crate::events::DomainEvent;

/// The identity the visibility filter runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub role: Role,
    pub patient_id: Option<String>,
}

impl Viewer {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            patient_id: None,
        }
    }

    pub fn patient(patient_id: impl Into<String>) -> Self {
        Self {
            role: Role::Patient,
            patient_id: Some(patient_id.into()),
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            role: user.role,
            patient_id: user.patient_id.clone(),
        }
    }
}

/// Visibility rule for one notification against one viewer.
///
/// A targeted notification is visible only to the matching role. Legacy
/// entries without a target: Admin sees everything; a Patient sees entries
/// tied to their own patient id, system entries, and entries tied to no
/// patient at all.
pub fn visible_to(notification: &Notification, viewer: &Viewer) -> bool {
    if let Some(target) = notification.target_role {
        return target == viewer.role;
    }
    match viewer.role {
        Role::Admin => true,
        Role::Patient => {
            notification.patient_id.is_none()
                || notification.patient_id == viewer.patient_id
                || notification.kind == NotificationKind::System
        }
    }
}

pub struct NotificationStore {
    store: Arc<DataStore>,
    relay: Arc<CrossSessionRelay>,
    viewer: Viewer,
    visible: Mutex<Vec<Notification>>,
}

impl NotificationStore {
    pub fn new(store: Arc<DataStore>, relay: Arc<CrossSessionRelay>, viewer: Viewer) -> Arc<Self> {
        let this = Arc::new(Self {
            store,
            relay,
            viewer,
            visible: Mutex::new(Vec::new()),
        });
        this.load();
        this
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Re-reads the persisted collection and rebuilds the visible list. A
    /// corrupt collection loads as empty; the next `create` reinitializes it.
    pub fn load(&self) {
        let all: Vec<Notification> = self.store.get(StoreKey::Notifications, Vec::new());
        let filtered: Vec<Notification> = all
            .into_iter()
            .filter(|n| visible_to(n, &self.viewer))
            .collect();
        if let Ok(mut visible) = self.visible.lock() {
            *visible = filtered;
        }
    }

    /// Creates a notification: persists it to the unfiltered collection,
    /// adds it to the visible list when the filter admits it, and publishes
    /// `NotificationCreated` — so the originating session always gets a toast
    /// attempt, whatever the persistent visibility outcome.
    pub fn create(&self, draft: NotificationDraft) -> Notification {
        let notification = Notification::from_draft(draft);

        let mut all: Vec<Notification> = self.store.get(StoreKey::Notifications, Vec::new());
        all.insert(0, notification.clone());
        self.store.set(StoreKey::Notifications, &all);

        if visible_to(&notification, &self.viewer) {
            if let Ok(mut visible) = self.visible.lock() {
                visible.insert(0, notification.clone());
            }
        }

        self.relay.publish(DomainEvent::NotificationCreated {
            notification: notification.clone(),
        });
        notification
    }

    /// Ingests a notification created in another session. No write-back: the
    /// originating session already persisted it.
    pub fn absorb(&self, notification: Notification) {
        if !visible_to(&notification, &self.viewer) {
            return;
        }
        if let Ok(mut visible) = self.visible.lock() {
            if visible.iter().any(|n| n.id == notification.id) {
                return;
            }
            visible.insert(0, notification);
        }
    }

    pub fn mark_read(&self, id: &str) {
        if let Ok(mut visible) = self.visible.lock() {
            for n in visible.iter_mut().filter(|n| n.id == id) {
                n.is_read = true;
            }
        }
        let mut all: Vec<Notification> = self.store.get(StoreKey::Notifications, Vec::new());
        for n in all.iter_mut().filter(|n| n.id == id) {
            n.is_read = true;
        }
        self.store.set(StoreKey::Notifications, &all);
    }

    /// Marks the session's visible set read. Admin marks the whole persisted
    /// collection; a Patient only touches entries their filter admits, so
    /// other recipients' unread state survives. Idempotent.
    pub fn mark_all_read(&self) {
        if let Ok(mut visible) = self.visible.lock() {
            for n in visible.iter_mut() {
                n.is_read = true;
            }
        }
        let mut all: Vec<Notification> = self.store.get(StoreKey::Notifications, Vec::new());
        for n in all.iter_mut() {
            if self.viewer.role == Role::Admin || visible_to(n, &self.viewer) {
                n.is_read = true;
            }
        }
        self.store.set(StoreKey::Notifications, &all);
    }

    pub fn delete(&self, id: &str) {
        if let Ok(mut visible) = self.visible.lock() {
            visible.retain(|n| n.id != id);
        }
        let mut all: Vec<Notification> = self.store.get(StoreKey::Notifications, Vec::new());
        all.retain(|n| n.id != id);
        self.store.set(StoreKey::Notifications, &all);
    }

    /// Clears the session's notifications. A Patient removes only entries
    /// carrying their own patient id from the persisted collection — other
    /// patients' entries and unowned entries survive. Admin wipes it.
    pub fn clear_all(&self) {
        if let Ok(mut visible) = self.visible.lock() {
            visible.clear();
        }
        match (&self.viewer.role, &self.viewer.patient_id) {
            (Role::Patient, Some(own)) => {
                let mut all: Vec<Notification> = self.store.get(StoreKey::Notifications, Vec::new());
                all.retain(|n| n.patient_id.as_deref() != Some(own.as_str()));
                self.store.set(StoreKey::Notifications, &all);
            }
            _ => {
                self.store.set(StoreKey::Notifications, &Vec::<Notification>::new());
            }
        }
    }

    pub fn visible(&self) -> Vec<Notification> {
        self.visible.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn unread_count(&self) -> usize {
        self.visible
            .lock()
            .map(|v| v.iter().filter(|n| !n.is_read).count())
            .unwrap_or(0)
    }
}
