//! Backend boundary errors.

use thiserror::Error;

use bombeiro_auth::AuthError;

/// Failure reported by (or on the way to) the hosted backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A single-row lookup matched no rows.
    #[error("row not found")]
    NotFound,

    /// A single-row lookup matched more than one row.
    #[error("expected a single row, got {0}")]
    UnexpectedRows(usize),

    /// The backend answered with a payload this client could not decode.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err {
            // The backend's message is the user-facing one ("Invalid login
            // credentials", ...), so carry it through verbatim.
            BackendError::Api { message, .. } => AuthError::Rejected(message),
            other => AuthError::Backend(other.to_string()),
        }
    }
}
