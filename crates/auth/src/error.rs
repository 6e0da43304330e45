//! Auth boundary error taxonomy.

use thiserror::Error;

/// Failure of a sign-up/sign-in/sign-out operation.
///
/// These are always caught at the session-store boundary, surfaced as a user
/// notification, and returned as values — never propagated as panics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The backend rejected the credentials or the account state.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or answered malformed data.
    #[error("backend error: {0}")]
    Backend(String),
}

impl AuthError {
    /// The user-facing message attached to the notification.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
