//! Key-value persistence layer.
//!
//! Three pieces, leaf first:
//! - [`backend`] — raw string storage (`MemoryBackend`, `FileBackend`).
//! - [`shared`] — one `SharedStorage` per logical browser: the backend behind
//!   a lock plus the change-notice fanout that reaches every open session.
//! - [`adapter`] — the per-session typed `DataStore` facade. All reads return
//!   safe defaults; all writes report success as a boolean and emit signals.

pub mod adapter;
pub mod backend;
pub mod shared;

pub use adapter::*;
pub use backend::*;
pub use shared::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage quota exceeded writing {key}: {attempted} bytes over a {quota}-byte quota")]
    QuotaExceeded {
        key: String,
        attempted: usize,
        quota: usize,
    },

    #[error("Serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// The closed set of persisted keys. Every value is a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Array of account records.
    Users,
    /// Array of patient records.
    Patients,
    /// Array of appointment/treatment records.
    Incidents,
    /// Array of notification records, unfiltered (all recipients).
    Notifications,
    /// The logged-in user, absent when signed out.
    CurrentUser,
    /// UI theme preference.
    Theme,
    /// Write-only relay slot for cross-session event fanout. Read only by
    /// storage watchers, never by application code.
    RelayEvent,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Patients => "patients",
            Self::Incidents => "incidents",
            Self::Notifications => "notifications",
            Self::CurrentUser => "currentUser",
            Self::Theme => "theme",
            Self::RelayEvent => "lastCrossSessionEvent",
        }
    }

    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "users" => Some(Self::Users),
            "patients" => Some(Self::Patients),
            "incidents" => Some(Self::Incidents),
            "notifications" => Some(Self::Notifications),
            "currentUser" => Some(Self::CurrentUser),
            "theme" => Some(Self::Theme),
            "lastCrossSessionEvent" => Some(Self::RelayEvent),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_raw_form() {
        for key in [
            StoreKey::Users,
            StoreKey::Patients,
            StoreKey::Incidents,
            StoreKey::Notifications,
            StoreKey::CurrentUser,
            StoreKey::Theme,
            StoreKey::RelayEvent,
        ] {
            assert_eq!(StoreKey::from_raw(key.as_str()), Some(key));
        }
    }

    #[test]
    fn unknown_raw_key_is_none() {
        assert_eq!(StoreKey::from_raw("sessionToken"), None);
    }
}
