//! Identity and session types observed from the auth service.
//!
//! Sessions are minted and expired by the hosted backend; this crate never
//! refreshes or validates tokens. The client only carries them and reacts to
//! pushed change notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bombeiro_core::UserId;

/// The authenticated principal as known to the backend auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A time-bounded credential associating this client with an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as reported by the backend. Informational only: the backend
    /// enforces the validity window.
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

/// Payload for account creation.
///
/// `display_name` is attached as initial profile metadata; the profile row
/// itself is produced by a backend-side trigger, not by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// Where the backend sends the user after e-mail confirmation.
    pub redirect_to: String,
}

/// Kind of auth-state change pushed by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A pushed auth-state notification: the event kind plus the session that is
/// now current (absent on sign-out).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: AuthEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: AuthEvent::SignedOut,
            session: None,
        }
    }
}
