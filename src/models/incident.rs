use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::IncidentStatus;

/// Appointment/treatment record persisted under the `incidents` store key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    pub description: String,
    pub comments: String,
    /// Local date-time of the appointment, e.g. `2025-01-22T14:00`.
    pub appointment_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    pub status: IncidentStatus,
    /// Follow-up date; completing an incident with this set schedules the follow-up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_date: Option<String>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
}

impl Incident {
    /// New scheduled incident with a generated id and creation timestamp.
    pub fn new(
        patient_id: impl Into<String>,
        title: impl Into<String>,
        appointment_date: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            title: title.into(),
            description: String::new(),
            comments: String::new(),
            appointment_date: appointment_date.into(),
            cost: None,
            treatment: None,
            status: IncidentStatus::Scheduled,
            next_date: None,
            files: Vec::new(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            is_paid: None,
            paid_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid.unwrap_or(false)
    }
}

/// File attached to an incident (x-rays, invoices).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: String,
}

/// Dashboard aggregate over the incident collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub revenue: f64,
}
