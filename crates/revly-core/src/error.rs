//! Error types for the Revly client core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevlyError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("State persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RevlyResult<T> = Result<T, RevlyError>;
