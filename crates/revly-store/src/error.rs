//! Store action error types.
//!
//! Every public store action returns `Result<_, StoreError>`; no
//! panic or raw remote error crosses the store boundary. Precondition
//! failures (`NoUser`, `TenantNotFound`) are returned inline and never
//! recorded on the store, remote failures are additionally recorded as
//! the store-level error string where the operation contract says so.

use revly_core::RevlyError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no user logged in")]
    NoUser,

    #[error("tenant not found: {id}")]
    TenantNotFound { id: Uuid },

    #[error("remote service error: {0}")]
    Remote(String),
}

impl From<RevlyError> for StoreError {
    fn from(err: RevlyError) -> Self {
        match err {
            RevlyError::AuthenticationFailed { .. } => StoreError::InvalidCredentials,
            other => StoreError::Remote(other.to_string()),
        }
    }
}
