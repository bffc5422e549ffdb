//! Session assembly.
//!
//! A `Session` is one open view of the clinic.
//! All sessions share one [`SharedStorage`]; each gets its own typed
//! adapter, event bus, relay, notification store, clinic service, and toast
//! feed, stitched together by a storage watcher that absorbs foreign-session
//! changes:
//!
//! - relay-slot writes are decoded and re-emitted on this session's bus,
//!   with created notifications absorbed into the local view first;
//! - direct collection writes (`patients`, `incidents`, `notifications`)
//!   trigger a wholesale re-read of the affected state.
//!
//! The watcher ignores this session's own writes; local mutations already
//! updated local state synchronously.

use std::sync::Arc;

use crate::auth::{AuthError, AuthService};
use crate::clinic::ClinicService;
use crate::events::{DomainEvent, EventBus};
use crate::models::{Theme, User};
use crate::notifications::{NotificationStore, Viewer};
use crate::reconcile::{start_reconciler, Reconciler, ReconcilerHandle};
use crate::relay::CrossSessionRelay;
use crate::seed;
use crate::store::{DataStore, SharedStorage, StoreKey, WatcherGuard};
use crate::toast::ToastHub;

pub struct Session {
    store: Arc<DataStore>,
    bus: EventBus,
    relay: Arc<CrossSessionRelay>,
    auth: Arc<AuthService>,
    clinic: Arc<ClinicService>,
    notifications: Arc<NotificationStore>,
    toasts: ToastHub,
    _watcher: WatcherGuard,
}

impl Session {
    /// Opens a session over the shared store for the given viewer, seeding
    /// demo data on first run.
    pub fn open(shared: Arc<SharedStorage>, viewer: Viewer) -> Self {
        let store = DataStore::new(shared.clone());
        seed::initialize(&store);

        let bus = EventBus::new();
        let relay = CrossSessionRelay::new(bus.clone(), store.clone());
        let notifications = NotificationStore::new(store.clone(), relay.clone(), viewer.clone());
        let clinic = ClinicService::new(store.clone(), relay.clone(), notifications.clone());
        let toasts = ToastHub::attach(&bus, viewer);
        let auth = AuthService::new(store.clone());

        let watcher = {
            let session_id = store.session_id();
            let relay = relay.clone();
            let bus = bus.clone();
            let clinic = clinic.clone();
            let notifications = notifications.clone();
            shared.watch(move |notice| {
                if notice.origin == session_id {
                    return;
                }
                match StoreKey::from_raw(&notice.key) {
                    Some(StoreKey::RelayEvent) => {
                        if let Some(event) = relay.decode(notice) {
                            if let DomainEvent::NotificationCreated { notification } = &event {
                                notifications.absorb(notification.clone());
                            }
                            if event.changes_clinic_data() {
                                clinic.refresh();
                            }
                            bus.emit(&event);
                        }
                    }
                    Some(StoreKey::Patients) | Some(StoreKey::Incidents) => clinic.refresh(),
                    Some(StoreKey::Notifications) => notifications.load(),
                    _ => {}
                }
            })
        };

        Self {
            store,
            bus,
            relay,
            auth,
            clinic,
            notifications,
            toasts,
            _watcher: watcher,
        }
    }

    /// Authenticates against the shared store and opens a session scoped to
    /// the logged-in user's role.
    pub fn sign_in(
        shared: Arc<SharedStorage>,
        email: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        let store = DataStore::new(shared.clone());
        seed::initialize(&store);
        let user = AuthService::new(store).login(email, password)?;
        Ok(Self::open(shared, Viewer::from_user(&user)))
    }

    // ── Component access ────────────────────────────────────

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn relay(&self) -> &Arc<CrossSessionRelay> {
        &self.relay
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    pub fn clinic(&self) -> &Arc<ClinicService> {
        &self.clinic
    }

    pub fn notifications(&self) -> &Arc<NotificationStore> {
        &self.notifications
    }

    pub fn toasts(&self) -> &ToastHub {
        &self.toasts
    }

    pub fn current_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    // ── Preferences ─────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.store.get(StoreKey::Theme, Theme::Light)
    }

    pub fn set_theme(&self, theme: Theme) {
        self.store.set(StoreKey::Theme, &theme);
    }

    // ── Background sync ─────────────────────────────────────

    /// Starts the periodic reconciliation loop for this session. Dropping
    /// the handle stops it.
    pub fn start_reconciler(&self) -> ReconcilerHandle {
        let reconciler = Reconciler::new(
            self.clinic.clone(),
            self.notifications.clone(),
            self.store.clone(),
            self.bus.clone(),
        );
        start_reconciler(reconciler)
    }
}
