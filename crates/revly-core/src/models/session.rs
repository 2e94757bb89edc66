//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential/token bundle for an authenticated principal.
///
/// Created on sign-in or a successful session check, refreshed via the
/// refresh token, invalidated on sign-out or expiry. A non-null session
/// always travels with the [`crate::models::user::User`] it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
