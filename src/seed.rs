//! First-run data seeding.
//!
//! A fresh store gets a demo directory of users, patients, and incidents so
//! every surface has something to show. Seeding runs only when the `users`
//! key is absent; an existing installation is never overwritten. Demo
//! passwords are hashed the same way real credentials are.

use std::sync::Arc;

use crate::auth::{generate_salt, hash_password};
use crate::models::{FileAttachment, Incident, IncidentStatus, Patient, Role, User};
use crate::store::{DataStore, StoreKey};

/// Seeds demo data into an empty store. Returns `true` when seeding ran.
pub fn initialize(store: &Arc<DataStore>) -> bool {
    let existing: Option<Vec<User>> = store.get(StoreKey::Users, None);
    if existing.is_some() {
        return false;
    }

    tracing::info!("Empty store detected, seeding demo data");
    store.set(StoreKey::Users, &seed_users());
    store.set(StoreKey::Patients, &seed_patients());
    store.set(StoreKey::Incidents, &seed_incidents());
    true
}

fn user(id: &str, email: &str, password: &str, role: Role, patient_id: Option<&str>, name: &str) -> User {
    let salt = generate_salt();
    User {
        id: id.into(),
        email: email.into(),
        password_hash: hash_password(password, &salt),
        password_salt: salt,
        role,
        patient_id: patient_id.map(Into::into),
        name: name.into(),
    }
}

fn seed_users() -> Vec<User> {
    vec![
        user("1", "admin@entnt.in", "admin123", Role::Admin, None, "Dr. Sarah Johnson"),
        user("2", "john@entnt.in", "patient123", Role::Patient, Some("p1"), "John Doe"),
        user("3", "emma@entnt.in", "patient123", Role::Patient, Some("p2"), "Emma Wilson"),
    ]
}

fn seed_patients() -> Vec<Patient> {
    vec![
        Patient {
            id: "p1".into(),
            name: "John Doe".into(),
            dob: "1990-05-10".into(),
            contact: "1234567890".into(),
            email: "john@entnt.in".into(),
            address: "123 Main St, Anytown USA".into(),
            emergency_contact: "0987654321".into(),
            health_info: "No known allergies, previous root canal in 2019".into(),
            insurance: Some("Delta Dental Premium".into()),
            created_at: "2024-01-15T10:00:00Z".into(),
            total_spent: None,
        },
        Patient {
            id: "p2".into(),
            name: "Emma Wilson".into(),
            dob: "1985-08-22".into(),
            contact: "5555551234".into(),
            email: "emma@entnt.in".into(),
            address: "456 Oak Ave, Springfield USA".into(),
            emergency_contact: "5555554321".into(),
            health_info: "Allergic to penicillin, wears braces".into(),
            insurance: Some("Cigna Dental Care".into()),
            created_at: "2024-02-01T14:30:00Z".into(),
            total_spent: None,
        },
        Patient {
            id: "p3".into(),
            name: "Michael Brown".into(),
            dob: "1975-12-03".into(),
            contact: "7777778888".into(),
            email: "michael@example.com".into(),
            address: "789 Pine Rd, Riverside USA".into(),
            emergency_contact: "7777779999".into(),
            health_info: "Diabetes, regular checkups needed".into(),
            insurance: Some("MetLife Dental".into()),
            created_at: "2024-01-20T09:15:00Z".into(),
            total_spent: None,
        },
    ]
}

fn seed_incidents() -> Vec<Incident> {
    vec![
        Incident {
            id: "i1".into(),
            patient_id: "p1".into(),
            title: "Routine Cleaning".into(),
            description: "Regular dental cleaning and checkup".into(),
            comments: "Good oral hygiene, minor plaque buildup".into(),
            appointment_date: "2025-01-15T10:00:00".into(),
            cost: Some(120.0),
            treatment: Some("Professional cleaning, fluoride treatment".into()),
            status: IncidentStatus::Completed,
            next_date: Some("2025-07-15T10:00:00".into()),
            files: vec![FileAttachment {
                id: "f1".into(),
                name: "cleaning_invoice.pdf".into(),
                mime_type: "application/pdf".into(),
                url: "data:application/pdf;base64,sample".into(),
                size: 1024,
                uploaded_at: "2025-01-15T10:30:00Z".into(),
            }],
            created_at: "2024-12-20T10:00:00Z".into(),
            is_paid: None,
            paid_at: None,
        },
        Incident {
            id: "i2".into(),
            patient_id: "p1".into(),
            title: "Toothache Consultation".into(),
            description: "Upper molar pain and sensitivity".into(),
            comments: "Sensitive to cold drinks, intermittent pain".into(),
            appointment_date: "2025-01-22T14:00:00".into(),
            cost: None,
            treatment: None,
            status: IncidentStatus::Scheduled,
            next_date: None,
            files: Vec::new(),
            created_at: "2025-01-18T16:00:00Z".into(),
            is_paid: None,
            paid_at: None,
        },
        Incident {
            id: "i3".into(),
            patient_id: "p2".into(),
            title: "Braces Adjustment".into(),
            description: "Monthly orthodontic adjustment".into(),
            comments: "Progress is good, tightening needed".into(),
            appointment_date: "2025-01-25T09:00:00".into(),
            cost: Some(80.0),
            treatment: Some("Wire adjustment, new elastics".into()),
            status: IncidentStatus::Completed,
            next_date: Some("2025-02-25T09:00:00".into()),
            files: vec![FileAttachment {
                id: "f2".into(),
                name: "braces_progress.jpg".into(),
                mime_type: "image/jpeg".into(),
                url: "https://images.pexels.com/photos/6812418/pexels-photo-6812418.jpeg?auto=compress&cs=tinysrgb&w=400".into(),
                size: 2048,
                uploaded_at: "2025-01-25T09:30:00Z".into(),
            }],
            created_at: "2025-01-20T11:00:00Z".into(),
            is_paid: None,
            paid_at: None,
        },
        Incident {
            id: "i4".into(),
            patient_id: "p3".into(),
            title: "Dental Implant Consultation".into(),
            description: "Consultation for replacing missing tooth".into(),
            comments: "Good candidate for implant, bone density adequate".into(),
            appointment_date: "2025-01-28T15:30:00".into(),
            cost: None,
            treatment: None,
            status: IncidentStatus::Scheduled,
            next_date: None,
            files: Vec::new(),
            created_at: "2025-01-22T13:00:00Z".into(),
            is_paid: None,
            paid_at: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SharedStorage;

    #[test]
    fn seeds_empty_store_once() {
        let store = DataStore::new(SharedStorage::in_memory());
        assert!(initialize(&store));
        assert!(!initialize(&store));

        let users: Vec<User> = store.get(StoreKey::Users, Vec::new());
        let patients: Vec<Patient> = store.get(StoreKey::Patients, Vec::new());
        let incidents: Vec<Incident> = store.get(StoreKey::Incidents, Vec::new());
        assert_eq!(users.len(), 3);
        assert_eq!(patients.len(), 3);
        assert_eq!(incidents.len(), 4);
    }

    #[test]
    fn does_not_overwrite_existing_data() {
        let store = DataStore::new(SharedStorage::in_memory());
        store.set(StoreKey::Users, &Vec::<User>::new());
        assert!(!initialize(&store));
        let patients: Vec<Patient> = store.get(StoreKey::Patients, Vec::new());
        assert!(patients.is_empty());
    }

    #[test]
    fn seeded_credentials_verify() {
        let store = DataStore::new(SharedStorage::in_memory());
        initialize(&store);
        let auth = crate::auth::AuthService::new(store);
        assert!(auth.login("admin@entnt.in", "admin123").is_ok());
        assert!(auth.login("john@entnt.in", "patient123").is_ok());
        assert!(auth.login("admin@entnt.in", "patient123").is_err());
    }

    #[test]
    fn patient_links_match_user_records() {
        let store = DataStore::new(SharedStorage::in_memory());
        initialize(&store);
        let users: Vec<User> = store.get(StoreKey::Users, Vec::new());
        let patients: Vec<Patient> = store.get(StoreKey::Patients, Vec::new());
        for user in users.iter().filter(|u| u.role == Role::Patient) {
            let pid = user.patient_id.as_deref().unwrap();
            assert!(patients.iter().any(|p| p.id == pid));
        }
    }

    #[test]
    fn every_seed_incident_references_a_seed_patient() {
        let store = DataStore::new(SharedStorage::in_memory());
        initialize(&store);
        let patients: Vec<Patient> = store.get(StoreKey::Patients, Vec::new());
        let incidents: Vec<Incident> = store.get(StoreKey::Incidents, Vec::new());
        for incident in &incidents {
            assert!(patients.iter().any(|p| p.id == incident.patient_id));
        }
    }
}
