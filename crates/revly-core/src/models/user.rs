//! Principal (user) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated identity as known by the remote identity service.
///
/// Users are created by sign-in/sign-up and cleared on sign-out. The
/// client never mutates them locally — every field mirrors the remote
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Set once the user has confirmed their email address.
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// Presence of a confirmation timestamp implies a verified address.
    pub fn is_email_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Attributes accepted at sign-up beyond the credentials themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpAttrs {
    pub full_name: Option<String>,
}
