use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patient record persisted under the `patients` store key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    /// Date of birth, YYYY-MM-DD.
    pub dob: String,
    pub contact: String,
    pub email: String,
    pub address: String,
    pub emergency_contact: String,
    pub health_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    pub created_at: String,
    /// Cumulative amount paid across all incidents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<f64>,
}

impl Patient {
    /// New patient with a generated id and creation timestamp.
    pub fn new(name: impl Into<String>, dob: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            dob: dob.into(),
            contact: String::new(),
            email: String::new(),
            address: String::new(),
            emergency_contact: String::new(),
            health_info: String::new(),
            insurance: None,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            total_spent: None,
        }
    }
}
