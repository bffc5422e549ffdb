//! Session authentication against the stored user directory.
//!
//! Credentials are verified with PBKDF2-HMAC-SHA256 over a per-user random
//! salt; hashes and salts are stored base64-encoded on the user record, and
//! comparison is constant-time. Login failures are uniform: an unknown email
//! and a wrong password produce the same error.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::models::User;
use crate::store::{DataStore, StoreKey};

const PBKDF2_ITERATIONS: u32 = 10_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
}

/// Derives the base64 password hash for the given base64 salt.
pub fn hash_password(password: &str, salt_b64: &str) -> String {
    let salt = BASE64.decode(salt_b64).unwrap_or_default();
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut out);
    BASE64.encode(out)
}

/// Fresh random salt, base64-encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    BASE64.encode(salt)
}

fn verify_password(password: &str, salt_b64: &str, hash_b64: &str) -> bool {
    let expected = match BASE64.decode(hash_b64) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let salt = match BASE64.decode(salt_b64) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut out);
    out.ct_eq(expected.as_slice()).into()
}

/// Per-session login state, persisted under the `currentUser` key so a
/// reopened session resumes where it left off.
pub struct AuthService {
    store: Arc<DataStore>,
    current: Mutex<Option<User>>,
}

impl AuthService {
    /// Restores any persisted session from the store.
    pub fn new(store: Arc<DataStore>) -> Arc<Self> {
        let current: Option<User> = store.get(StoreKey::CurrentUser, None);
        Arc::new(Self {
            store,
            current: Mutex::new(current),
        })
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.lock().ok().and_then(|u| u.clone())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let users: Vec<User> = self.store.get(StoreKey::Users, Vec::new());
        let user = users
            .iter()
            .find(|u| u.email == email)
            .filter(|u| verify_password(password, &u.password_salt, &u.password_hash))
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        tracing::info!(role = user.role.as_str(), "User logged in");
        self.store.set(StoreKey::CurrentUser, &user);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(user.clone());
        }
        Ok(user)
    }

    pub fn logout(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
        self.store.remove(StoreKey::CurrentUser);
        tracing::info!("User logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::SharedStorage;
    use uuid::Uuid;

    fn user(email: &str, password: &str, role: Role) -> User {
        let salt = generate_salt();
        User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, &salt),
            password_salt: salt,
            role,
            patient_id: None,
            name: "Test User".into(),
        }
    }

    fn service_with(users: Vec<User>) -> (Arc<AuthService>, Arc<SharedStorage>) {
        let shared = SharedStorage::in_memory();
        let store = DataStore::new(shared.clone());
        store.set(StoreKey::Users, &users);
        (AuthService::new(store), shared)
    }

    #[test]
    fn login_with_correct_credentials_succeeds() {
        let (auth, _s) = service_with(vec![user("admin@entnt.in", "admin123", Role::Admin)]);
        let logged_in = auth.login("admin@entnt.in", "admin123").unwrap();
        assert_eq!(logged_in.email, "admin@entnt.in");
        assert_eq!(auth.current_user().unwrap().email, "admin@entnt.in");
    }

    #[test]
    fn wrong_password_and_unknown_email_fail_identically() {
        let (auth, _s) = service_with(vec![user("admin@entnt.in", "admin123", Role::Admin)]);
        let wrong_password = auth.login("admin@entnt.in", "nope").unwrap_err();
        let unknown_email = auth.login("ghost@entnt.in", "admin123").unwrap_err();
        assert_eq!(wrong_password, unknown_email);
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn login_persists_and_logout_removes_current_user() {
        let (auth, shared) = service_with(vec![user("john@entnt.in", "patient123", Role::Patient)]);
        auth.login("john@entnt.in", "patient123").unwrap();
        assert!(shared.get_raw(StoreKey::CurrentUser.as_str()).is_some());

        auth.logout();
        assert!(auth.current_user().is_none());
        assert!(shared.get_raw(StoreKey::CurrentUser.as_str()).is_none());
    }

    #[test]
    fn new_service_restores_persisted_session() {
        let (auth, shared) = service_with(vec![user("john@entnt.in", "patient123", Role::Patient)]);
        auth.login("john@entnt.in", "patient123").unwrap();

        let resumed = AuthService::new(DataStore::new(shared));
        assert_eq!(resumed.current_user().unwrap().email, "john@entnt.in");
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let a = generate_salt();
        let b = generate_salt();
        assert_ne!(a, b);
        assert_ne!(hash_password("admin123", &a), hash_password("admin123", &b));
        assert_eq!(hash_password("admin123", &a), hash_password("admin123", &a));
    }
}
