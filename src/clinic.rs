//! Clinic domain service: patient and incident lifecycle plus payments.
//!
//! Each session holds one `ClinicService` mirroring the persisted patient and
//! incident collections in memory. Every user action persists through the
//! typed store, produces the matching notifications, and publishes a domain
//! event through the cross-session relay. Validation happens before any
//! mutation, so a failed action writes no partial state.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::events::DomainEvent;
use crate::models::{
    AppointmentStats, Incident, IncidentStatus, NotificationDraft, NotificationKind,
    NotificationPriority, Patient, Role,
};
use crate::notifications::NotificationStore;
use crate::relay::CrossSessionRelay;
use crate::store::{DataStore, StoreKey};

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Appointment not found: {0}")]
    IncidentNotFound(String),
}

pub struct ClinicService {
    store: Arc<DataStore>,
    relay: Arc<CrossSessionRelay>,
    notifications: Arc<NotificationStore>,
    patients: Mutex<Vec<Patient>>,
    incidents: Mutex<Vec<Incident>>,
}

impl ClinicService {
    /// Builds the service from whatever the store currently holds.
    pub fn new(
        store: Arc<DataStore>,
        relay: Arc<CrossSessionRelay>,
        notifications: Arc<NotificationStore>,
    ) -> Arc<Self> {
        let patients: Vec<Patient> = store.get(StoreKey::Patients, Vec::new());
        let incidents: Vec<Incident> = store.get(StoreKey::Incidents, Vec::new());
        Arc::new(Self {
            store,
            relay,
            notifications,
            patients: Mutex::new(patients),
            incidents: Mutex::new(incidents),
        })
    }

    // ── Read access ─────────────────────────────────────────

    pub fn patients(&self) -> Vec<Patient> {
        self.patients.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn patient(&self, id: &str) -> Option<Patient> {
        self.patients
            .lock()
            .ok()
            .and_then(|p| p.iter().find(|p| p.id == id).cloned())
    }

    pub fn incident(&self, id: &str) -> Option<Incident> {
        self.incidents
            .lock()
            .ok()
            .and_then(|i| i.iter().find(|i| i.id == id).cloned())
    }

    pub fn patient_incidents(&self, patient_id: &str) -> Vec<Incident> {
        self.incidents
            .lock()
            .map(|incidents| {
                incidents
                    .iter()
                    .filter(|i| i.patient_id == patient_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dashboard aggregate: status counts plus revenue over completed costs.
    pub fn appointment_stats(&self) -> AppointmentStats {
        let incidents = self.incidents();
        let mut stats = AppointmentStats {
            total: incidents.len(),
            ..AppointmentStats::default()
        };
        for incident in &incidents {
            match incident.status {
                IncidentStatus::Scheduled => stats.scheduled += 1,
                IncidentStatus::Completed => {
                    stats.completed += 1;
                    stats.revenue += incident.cost.unwrap_or(0.0);
                }
                IncidentStatus::Cancelled => stats.cancelled += 1,
                IncidentStatus::InProgress => {}
            }
        }
        stats
    }

    /// Replaces in-memory state wholesale from the store. Used after a
    /// foreign-session change notice and by the reconciliation loop.
    pub fn refresh(&self) {
        let patients: Vec<Patient> = self.store.get(StoreKey::Patients, Vec::new());
        let incidents: Vec<Incident> = self.store.get(StoreKey::Incidents, Vec::new());
        if let Ok(mut guard) = self.patients.lock() {
            *guard = patients;
        }
        if let Ok(mut guard) = self.incidents.lock() {
            *guard = incidents;
        }
    }

    // ── Patients ────────────────────────────────────────────

    pub fn add_patient(&self, patient: Patient) {
        let updated = {
            let mut guard = match self.patients.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            guard.push(patient.clone());
            guard.clone()
        };
        self.store.set(StoreKey::Patients, &updated);

        self.notifications.create(NotificationDraft::new(
            "New Patient Added",
            format!(
                "Patient {} has been successfully added to the system.",
                patient.name
            ),
            NotificationKind::System,
            NotificationPriority::Low,
        ));
        self.relay.publish(DomainEvent::PatientAdded { patient });
    }

    pub fn update_patient(&self, patient: Patient) -> Result<(), ClinicError> {
        let updated = {
            let mut guard = self
                .patients
                .lock()
                .map_err(|_| ClinicError::PatientNotFound(patient.id.clone()))?;
            let slot = guard
                .iter_mut()
                .find(|p| p.id == patient.id)
                .ok_or_else(|| ClinicError::PatientNotFound(patient.id.clone()))?;
            *slot = patient.clone();
            guard.clone()
        };
        self.store.set(StoreKey::Patients, &updated);

        self.notifications.create(
            NotificationDraft::new(
                "Profile Updated",
                "Your patient profile information has been updated by your healthcare provider.",
                NotificationKind::Update,
                NotificationPriority::Medium,
            )
            .for_patient(patient.id.clone()),
        );
        self.relay.publish(DomainEvent::PatientUpdated { patient });
        Ok(())
    }

    /// Removes the patient and cascades to every incident referencing them.
    /// Two store writes, not a transaction; a crash in between leaves
    /// orphaned incidents behind.
    pub fn delete_patient(&self, id: &str) -> Result<(), ClinicError> {
        let patient = self
            .patient(id)
            .ok_or_else(|| ClinicError::PatientNotFound(id.to_string()))?;

        let remaining_patients = {
            let mut guard = self
                .patients
                .lock()
                .map_err(|_| ClinicError::PatientNotFound(id.to_string()))?;
            guard.retain(|p| p.id != id);
            guard.clone()
        };
        self.store.set(StoreKey::Patients, &remaining_patients);

        let remaining_incidents = {
            let mut guard = match self.incidents.lock() {
                Ok(guard) => guard,
                Err(_) => return Ok(()),
            };
            guard.retain(|i| i.patient_id != id);
            guard.clone()
        };
        self.store.set(StoreKey::Incidents, &remaining_incidents);

        self.notifications.create(NotificationDraft::new(
            "Patient Removed",
            format!(
                "Patient {} and all related records have been removed from the system.",
                patient.name
            ),
            NotificationKind::System,
            NotificationPriority::Medium,
        ));
        self.relay.publish(DomainEvent::PatientDeleted {
            patient_id: id.to_string(),
        });
        Ok(())
    }

    // ── Incidents ───────────────────────────────────────────

    pub fn add_incident(&self, incident: Incident) -> Result<(), ClinicError> {
        // Checked before any write: a dangling patient id stores nothing.
        if self.patient(&incident.patient_id).is_none() {
            return Err(ClinicError::PatientNotFound(incident.patient_id.clone()));
        }

        let updated = {
            let mut guard = self
                .incidents
                .lock()
                .map_err(|_| ClinicError::IncidentNotFound(incident.id.clone()))?;
            guard.push(incident.clone());
            guard.clone()
        };
        self.store.set(StoreKey::Incidents, &updated);

        self.notifications.create(
            NotificationDraft::new(
                "New Appointment Scheduled",
                format!(
                    "Your appointment \"{}\" has been scheduled for {}",
                    incident.title,
                    format_appointment_time(&incident.appointment_date)
                ),
                NotificationKind::Appointment,
                NotificationPriority::High,
            )
            .for_patient(incident.patient_id.clone())
            .for_appointment(incident.id.clone())
            .targeting(Role::Patient),
        );
        self.relay.publish(DomainEvent::AppointmentAdded { incident });
        Ok(())
    }

    /// Persists the updated incident. Completing one with a follow-up date
    /// auto-schedules the follow-up appointment and its notification.
    pub fn update_incident(&self, incident: Incident) -> Result<(), ClinicError> {
        let updated = {
            let mut guard = self
                .incidents
                .lock()
                .map_err(|_| ClinicError::IncidentNotFound(incident.id.clone()))?;
            let slot = guard
                .iter_mut()
                .find(|i| i.id == incident.id)
                .ok_or_else(|| ClinicError::IncidentNotFound(incident.id.clone()))?;
            *slot = incident.clone();
            guard.clone()
        };
        self.store.set(StoreKey::Incidents, &updated);

        if incident.status == IncidentStatus::Completed {
            if let Some(next_date) = incident.next_date.clone() {
                self.schedule_follow_up(&incident, next_date);
            }
        }

        self.notifications.create(
            NotificationDraft::new(
                "Appointment Updated",
                format!(
                    "Your appointment \"{}\" has been updated. New date/time: {}",
                    incident.title,
                    format_appointment_time(&incident.appointment_date)
                ),
                NotificationKind::Update,
                NotificationPriority::High,
            )
            .for_patient(incident.patient_id.clone())
            .for_appointment(incident.id.clone())
            .targeting(Role::Patient),
        );
        self.relay
            .publish(DomainEvent::AppointmentUpdated { incident });
        Ok(())
    }

    fn schedule_follow_up(&self, completed: &Incident, next_date: String) {
        let follow_up = Incident {
            id: Uuid::new_v4().to_string(),
            patient_id: completed.patient_id.clone(),
            title: format!("Follow-up: {}", completed.title),
            description: format!(
                "Follow-up appointment for {}",
                completed.title.to_lowercase()
            ),
            comments: format!("Scheduled follow-up after {}", completed.title),
            appointment_date: next_date,
            cost: None,
            treatment: None,
            status: IncidentStatus::Scheduled,
            next_date: None,
            files: Vec::new(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            is_paid: None,
            paid_at: None,
        };

        let updated = {
            let mut guard = match self.incidents.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            guard.push(follow_up.clone());
            guard.clone()
        };
        self.store.set(StoreKey::Incidents, &updated);

        self.notifications.create(
            NotificationDraft::new(
                "Follow-up Appointment Scheduled",
                format!(
                    "Your follow-up appointment \"{}\" has been scheduled for {}",
                    follow_up.title,
                    format_appointment_time(&follow_up.appointment_date)
                ),
                NotificationKind::Appointment,
                NotificationPriority::High,
            )
            .for_patient(follow_up.patient_id.clone())
            .for_appointment(follow_up.id.clone())
            .targeting(Role::Patient),
        );
        self.relay.publish(DomainEvent::AppointmentAdded {
            incident: follow_up,
        });
    }

    pub fn delete_incident(&self, id: &str) -> Result<(), ClinicError> {
        let incident = self
            .incident(id)
            .ok_or_else(|| ClinicError::IncidentNotFound(id.to_string()))?;

        let updated = {
            let mut guard = self
                .incidents
                .lock()
                .map_err(|_| ClinicError::IncidentNotFound(id.to_string()))?;
            guard.retain(|i| i.id != id);
            guard.clone()
        };
        self.store.set(StoreKey::Incidents, &updated);

        self.notifications.create(
            NotificationDraft::new(
                "Appointment Cancelled",
                format!(
                    "Your appointment \"{}\" scheduled for {} has been cancelled.",
                    incident.title,
                    format_appointment_time(&incident.appointment_date)
                ),
                NotificationKind::Cancellation,
                NotificationPriority::High,
            )
            .for_patient(incident.patient_id.clone())
            .for_appointment(incident.id.clone())
            .targeting(Role::Patient),
        );
        self.relay
            .publish(DomainEvent::AppointmentDeleted { incident });
        Ok(())
    }

    // ── Payments ────────────────────────────────────────────

    /// Marks the incident paid and adds the amount to the patient's
    /// cumulative spend. Both records are validated before either write.
    /// Produces one notification for the patient and one for the admin.
    pub fn process_payment(&self, incident_id: &str, amount: f64) -> Result<(), ClinicError> {
        let mut incident = self
            .incident(incident_id)
            .ok_or_else(|| ClinicError::IncidentNotFound(incident_id.to_string()))?;
        let mut patient = self
            .patient(&incident.patient_id)
            .ok_or_else(|| ClinicError::PatientNotFound(incident.patient_id.clone()))?;

        incident.is_paid = Some(true);
        incident.paid_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        patient.total_spent = Some(patient.total_spent.unwrap_or(0.0) + amount);

        let updated_incidents = {
            let mut guard = self
                .incidents
                .lock()
                .map_err(|_| ClinicError::IncidentNotFound(incident_id.to_string()))?;
            if let Some(slot) = guard.iter_mut().find(|i| i.id == incident_id) {
                *slot = incident.clone();
            }
            guard.clone()
        };
        let updated_patients = {
            let mut guard = self
                .patients
                .lock()
                .map_err(|_| ClinicError::PatientNotFound(patient.id.clone()))?;
            if let Some(slot) = guard.iter_mut().find(|p| p.id == patient.id) {
                *slot = patient.clone();
            }
            guard.clone()
        };
        self.store.set(StoreKey::Incidents, &updated_incidents);
        self.store.set(StoreKey::Patients, &updated_patients);

        self.notifications.create(
            NotificationDraft::new(
                "Payment Confirmed",
                format!(
                    "Your payment of ${amount} for \"{}\" has been successfully processed. Thank you for your payment!",
                    incident.title
                ),
                NotificationKind::Update,
                NotificationPriority::Medium,
            )
            .for_patient(patient.id.clone())
            .for_appointment(incident_id)
            .targeting(Role::Patient),
        );
        self.notifications.create(
            NotificationDraft::new(
                "Payment Received",
                format!(
                    "Payment of ${amount} received from {} for \"{}\". Amount has been added to your revenue.",
                    patient.name, incident.title
                ),
                NotificationKind::System,
                NotificationPriority::Low,
            )
            .targeting(Role::Admin),
        );
        self.relay.publish(DomainEvent::PaymentProcessed {
            incident_id: incident_id.to_string(),
            patient_id: patient.id,
            amount,
        });
        Ok(())
    }
}

/// Human-readable appointment slot for notification messages. Falls back to
/// the raw string when the stored value is not a recognized date-time form.
fn format_appointment_time(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%B %d, %Y at %H:%M").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%B %d, %Y at %H:%M").to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::notifications::Viewer;
    use crate::store::SharedStorage;

    fn service() -> (Arc<ClinicService>, Arc<NotificationStore>, Arc<SharedStorage>) {
        let shared = SharedStorage::in_memory();
        let store = DataStore::new(shared.clone());
        let relay = CrossSessionRelay::new(EventBus::new(), store.clone());
        let notifications = NotificationStore::new(store.clone(), relay.clone(), Viewer::admin());
        let clinic = ClinicService::new(store, relay, notifications.clone());
        (clinic, notifications, shared)
    }

    fn jane() -> Patient {
        let mut p = Patient::new("Jane Doe", "1990-01-01");
        p.contact = "555-0100".into();
        p.email = "jane@x.com".into();
        p
    }

    // ───────────────────────────────────────
    // patients
    // ───────────────────────────────────────

    #[test]
    fn add_patient_grows_store_and_notifies_admin() {
        let (clinic, notifications, shared) = service();
        clinic.add_patient(jane());

        assert_eq!(clinic.patients().len(), 1);
        let store = DataStore::new(shared);
        let persisted: Vec<Patient> = store.get(StoreKey::Patients, Vec::new());
        assert_eq!(persisted.len(), 1);

        let visible = notifications.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, NotificationKind::System);
        assert!(visible[0].message.contains("Jane Doe"));
    }

    #[test]
    fn update_patient_replaces_record() {
        let (clinic, _n, _s) = service();
        let mut patient = jane();
        clinic.add_patient(patient.clone());

        patient.address = "12 Elm St".into();
        clinic.update_patient(patient.clone()).unwrap();
        assert_eq!(clinic.patient(&patient.id).unwrap().address, "12 Elm St");
    }

    #[test]
    fn update_unknown_patient_is_an_error() {
        let (clinic, _n, _s) = service();
        let err = clinic.update_patient(jane()).unwrap_err();
        assert!(matches!(err, ClinicError::PatientNotFound(_)));
    }

    #[test]
    fn delete_patient_cascades_to_incidents() {
        let (clinic, _n, _s) = service();
        let patient = jane();
        let other = Patient::new("Sam Ortiz", "1980-02-02");
        clinic.add_patient(patient.clone());
        clinic.add_patient(other.clone());
        clinic
            .add_incident(Incident::new(&patient.id, "Cleaning", "2025-03-01T10:00"))
            .unwrap();
        clinic
            .add_incident(Incident::new(&patient.id, "Checkup", "2025-04-01T10:00"))
            .unwrap();
        clinic
            .add_incident(Incident::new(&other.id, "Filling", "2025-03-02T11:00"))
            .unwrap();

        clinic.delete_patient(&patient.id).unwrap();

        assert!(clinic.patient(&patient.id).is_none());
        assert!(clinic
            .incidents()
            .iter()
            .all(|i| i.patient_id != patient.id));
        assert_eq!(clinic.patient_incidents(&other.id).len(), 1);
    }

    // ───────────────────────────────────────
    // incidents
    // ───────────────────────────────────────

    #[test]
    fn add_incident_requires_existing_patient() {
        let (clinic, _n, _s) = service();
        let err = clinic
            .add_incident(Incident::new("ghost", "Cleaning", "2025-03-01T10:00"))
            .unwrap_err();
        assert!(matches!(err, ClinicError::PatientNotFound(_)));
        assert!(clinic.incidents().is_empty());
    }

    #[test]
    fn add_incident_targets_owning_patient() {
        let (clinic, _n, shared) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());
        let incident = Incident::new(&patient.id, "Toothache Consultation", "2025-01-22T14:00");
        clinic.add_incident(incident.clone()).unwrap();

        let store = DataStore::new(shared);
        let store_b = NotificationStore::new(
            store.clone(),
            CrossSessionRelay::new(EventBus::new(), store),
            Viewer::patient(patient.id.clone()),
        );
        let visible = store_b.visible();
        let appt = visible
            .iter()
            .find(|n| n.kind == NotificationKind::Appointment)
            .unwrap();
        assert_eq!(appt.target_role, Some(Role::Patient));
        assert_eq!(appt.appointment_id.as_deref(), Some(incident.id.as_str()));
    }

    #[test]
    fn completing_with_next_date_schedules_follow_up() {
        let (clinic, notifications, _s) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());
        let mut incident = Incident::new(&patient.id, "Root Canal", "2025-02-01T10:00");
        clinic.add_incident(incident.clone()).unwrap();

        incident.status = IncidentStatus::Completed;
        incident.next_date = Some("2025-03-01T10:00".into());
        clinic.update_incident(incident.clone()).unwrap();

        let incidents = clinic.incidents();
        assert_eq!(incidents.len(), 2);
        let follow_up = incidents
            .iter()
            .find(|i| i.title == "Follow-up: Root Canal")
            .unwrap();
        assert_eq!(follow_up.status, IncidentStatus::Scheduled);
        assert_eq!(follow_up.appointment_date, "2025-03-01T10:00");
        assert_eq!(follow_up.patient_id, patient.id);
        assert!(follow_up.files.is_empty());

        // A follow-up appointment notification targeted at the patient exists.
        let persisted: Vec<crate::models::Notification> =
            clinic.store.get(StoreKey::Notifications, Vec::new());
        assert!(persisted.iter().any(|n| {
            n.kind == NotificationKind::Appointment
                && n.target_role == Some(Role::Patient)
                && n.appointment_id.as_deref() == Some(follow_up.id.as_str())
        }));
        assert!(!notifications.visible().is_empty());
    }

    #[test]
    fn update_without_completion_schedules_nothing_extra() {
        let (clinic, _n, _s) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());
        let mut incident = Incident::new(&patient.id, "Cleaning", "2025-02-01T10:00");
        clinic.add_incident(incident.clone()).unwrap();

        incident.status = IncidentStatus::InProgress;
        incident.next_date = Some("2025-03-01T10:00".into());
        clinic.update_incident(incident).unwrap();
        assert_eq!(clinic.incidents().len(), 1);
    }

    #[test]
    fn delete_incident_produces_cancellation() {
        let (clinic, _n, _s) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());
        let incident = Incident::new(&patient.id, "Cleaning", "2025-02-01T10:00");
        clinic.add_incident(incident.clone()).unwrap();
        clinic.delete_incident(&incident.id).unwrap();

        assert!(clinic.incidents().is_empty());
        let persisted: Vec<crate::models::Notification> =
            clinic.store.get(StoreKey::Notifications, Vec::new());
        assert!(persisted
            .iter()
            .any(|n| n.kind == NotificationKind::Cancellation));
    }

    // ───────────────────────────────────────
    // payments
    // ───────────────────────────────────────

    #[test]
    fn payment_flips_paid_and_accumulates_spend() {
        let (clinic, _n, _s) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());
        let mut incident = Incident::new(&patient.id, "Routine Cleaning", "2025-01-15T10:00");
        incident.status = IncidentStatus::Completed;
        incident.cost = Some(120.0);
        clinic.add_incident(incident.clone()).unwrap();

        clinic.process_payment(&incident.id, 120.0).unwrap();

        let paid = clinic.incident(&incident.id).unwrap();
        assert!(paid.is_paid());
        assert!(paid.paid_at.is_some());
        assert_eq!(clinic.patient(&patient.id).unwrap().total_spent, Some(120.0));

        // One notification per role.
        let persisted: Vec<crate::models::Notification> =
            clinic.store.get(StoreKey::Notifications, Vec::new());
        assert!(persisted
            .iter()
            .any(|n| n.target_role == Some(Role::Patient) && n.title == "Payment Confirmed"));
        assert!(persisted
            .iter()
            .any(|n| n.target_role == Some(Role::Admin) && n.title == "Payment Received"));
    }

    #[test]
    fn payment_against_unknown_incident_writes_nothing() {
        let (clinic, _n, _s) = service();
        clinic.add_patient(jane());
        let err = clinic.process_payment("ghost", 50.0).unwrap_err();
        assert!(matches!(err, ClinicError::IncidentNotFound(_)));
        let persisted: Vec<crate::models::Notification> =
            clinic.store.get(StoreKey::Notifications, Vec::new());
        // Only the add-patient notification exists.
        assert_eq!(persisted.len(), 1);
    }

    #[test]
    fn repeated_payments_accumulate() {
        let (clinic, _n, _s) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());
        let a = Incident::new(&patient.id, "Cleaning", "2025-01-15T10:00");
        let b = Incident::new(&patient.id, "Filling", "2025-02-15T10:00");
        clinic.add_incident(a.clone()).unwrap();
        clinic.add_incident(b.clone()).unwrap();

        clinic.process_payment(&a.id, 120.0).unwrap();
        clinic.process_payment(&b.id, 80.5).unwrap();
        assert_eq!(clinic.patient(&patient.id).unwrap().total_spent, Some(200.5));
    }

    // ───────────────────────────────────────
    // stats and formatting
    // ───────────────────────────────────────

    #[test]
    fn stats_count_statuses_and_revenue() {
        let (clinic, _n, _s) = service();
        let patient = jane();
        clinic.add_patient(patient.clone());

        let mut completed = Incident::new(&patient.id, "A", "2025-01-01T09:00");
        completed.status = IncidentStatus::Completed;
        completed.cost = Some(100.0);
        let mut cancelled = Incident::new(&patient.id, "B", "2025-01-02T09:00");
        cancelled.status = IncidentStatus::Cancelled;
        let scheduled = Incident::new(&patient.id, "C", "2025-01-03T09:00");
        for i in [completed, cancelled, scheduled] {
            clinic.add_incident(i).unwrap();
        }

        let stats = clinic.appointment_stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.scheduled, 1);
        assert_eq!(stats.revenue, 100.0);
    }

    #[test]
    fn appointment_time_formats_known_shapes() {
        assert_eq!(
            format_appointment_time("2025-01-22T14:00"),
            "January 22, 2025 at 14:00"
        );
        assert_eq!(
            format_appointment_time("2025-01-15T10:00:00"),
            "January 15, 2025 at 10:00"
        );
        assert_eq!(format_appointment_time("soon"), "soon");
    }
}
