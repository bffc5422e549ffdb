//! Transient in-session toast feed.
//!
//! Listens on the session bus and turns notification and sync events into
//! short-lived display entries. The queue is bounded; when full, the oldest
//! toast is dropped. Consumers poll with [`ToastHub::drain`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};

use crate::events::{DomainEvent, EventBus, Subscription};
use crate::models::NotificationPriority;
use crate::notifications::{visible_to, Viewer};

const MAX_QUEUED_TOASTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Notice,
    Urgent,
}

impl From<NotificationPriority> for ToastLevel {
    fn from(priority: NotificationPriority) -> Self {
        match priority {
            NotificationPriority::Low => ToastLevel::Info,
            NotificationPriority::Medium => ToastLevel::Notice,
            NotificationPriority::High => ToastLevel::Urgent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub level: ToastLevel,
    pub created_at: String,
}

/// Bounded toast queue fed by bus events.
pub struct ToastHub {
    queue: Arc<Mutex<VecDeque<Toast>>>,
    _subscription: Subscription,
}

impl ToastHub {
    /// Subscribes to the bus for the lifetime of the hub. Only notifications
    /// visible to `viewer` produce toasts.
    pub fn attach(bus: &EventBus, viewer: Viewer) -> Self {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let sink = queue.clone();
        let subscription = bus.subscribe(move |event| {
            let toast = match event {
                DomainEvent::NotificationCreated { notification }
                    if visible_to(notification, &viewer) =>
                {
                    Some(Toast {
                        title: notification.title.clone(),
                        message: notification.message.clone(),
                        level: notification.priority.into(),
                        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    })
                }
                DomainEvent::DataSynchronized { .. } => Some(Toast {
                    title: "Data Synchronized".into(),
                    message: "Your view has been refreshed with the latest records.".into(),
                    level: ToastLevel::Info,
                    created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                }),
                _ => None,
            };
            if let Some(toast) = toast {
                if let Ok(mut queue) = sink.lock() {
                    if queue.len() == MAX_QUEUED_TOASTS {
                        queue.pop_front();
                    }
                    queue.push_back(toast);
                }
            }
        });
        Self {
            queue,
            _subscription: subscription,
        }
    }

    /// Removes and returns all queued toasts, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.queue
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
