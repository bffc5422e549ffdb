use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Account record persisted under the `users` store key.
///
/// Credentials are stored as a PBKDF2-HMAC-SHA256 hash plus per-user salt
/// (both base64), never as plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub name: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
