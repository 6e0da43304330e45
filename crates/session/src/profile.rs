//! Profile loader.

use bombeiro_auth::Profile;
use bombeiro_backend::{BackendClient, BackendError, Query};
use bombeiro_core::UserId;

/// Fetch the profile row for `user_id`, or report absence.
///
/// Lookup failures are logged and downgraded to `None`: a missing or
/// unreadable profile must never block the settle transition, it just means
/// no role-derived privilege. No retries, no caching.
pub async fn load_profile(backend: &dyn BackendClient, user_id: UserId) -> Option<Profile> {
    let row = match backend
        .select_single("profiles", Query::new().eq("user_id", user_id))
        .await
    {
        Ok(row) => row,
        Err(BackendError::NotFound) => {
            tracing::debug!(%user_id, "no profile row");
            return None;
        }
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "profile fetch failed");
            return None;
        }
    };

    match serde_json::from_value(row) {
        Ok(profile) => Some(profile),
        Err(err) => {
            tracing::error!(%user_id, error = %err, "profile row did not decode");
            None
        }
    }
}
