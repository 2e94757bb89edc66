//! Remote-layer error types and conversions.

use revly_core::RevlyError;

/// Transport-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication rejected: {0}")]
    Unauthorized(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<RemoteError> for RevlyError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unauthorized(reason) => RevlyError::AuthenticationFailed { reason },
            RemoteError::NotFound { entity, id } => RevlyError::NotFound { entity, id },
            other => RevlyError::Remote(other.to_string()),
        }
    }
}
