use chrono::{SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enums::{NotificationKind, NotificationPriority, Role};

/// Notification persisted under the `notifications` store key.
///
/// Content fields are immutable after creation; only `is_read` flips, and
/// deletion removes the record. No update-in-place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub created_at: String,
    /// Ties the notification to one patient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    /// Ties the notification to one incident record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// When set, visible only to sessions whose user has this role.
    /// Absent on legacy entries, which fall back to patient-id filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_role: Option<Role>,
}

impl Notification {
    /// Materializes a draft: assigns the id, creation timestamp, and unread state.
    pub fn from_draft(draft: NotificationDraft) -> Self {
        Self {
            id: generate_notification_id(),
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            priority: draft.priority,
            is_read: false,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            patient_id: draft.patient_id,
            appointment_id: draft.appointment_id,
            action_url: draft.action_url,
            target_role: draft.target_role,
        }
    }
}

/// Producer-supplied notification content. The store fills in id,
/// `created_at`, and `is_read` at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_role: Option<Role>,
}

impl NotificationDraft {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        priority: NotificationPriority,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            priority,
            patient_id: None,
            appointment_id: None,
            action_url: None,
            target_role: None,
        }
    }

    pub fn for_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn for_appointment(mut self, appointment_id: impl Into<String>) -> Self {
        self.appointment_id = Some(appointment_id.into());
        self
    }

    pub fn targeting(mut self, role: Role) -> Self {
        self.target_role = Some(role);
        self
    }
}

/// Opaque unique id: millisecond timestamp plus a random suffix.
fn generate_notification_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("n{}_{}", Utc::now().timestamp_millis(), suffix)
}
