//! Route-guard decisions for protected surfaces.
//!
//! Pages do not raise authorization errors; they redirect. This helper turns
//! the observed [`AuthState`] plus a route's role requirement into the one
//! decision the page acts on.

use bombeiro_auth::Role;

use crate::state::AuthState;

/// What a protected route should do right now.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Still settling: render a placeholder, issue no protected queries.
    Pending,
    /// Settled without a user: go to the authentication entry point.
    RedirectToSignIn,
    /// Signed in but the role requirement is not met: leave the protected
    /// area (editor routes land back on the dashboard).
    RedirectToDashboard,
    /// Render and query away.
    Allow,
}

/// Decide what a route with an optional role requirement should do.
pub fn guard(state: &AuthState, required: Option<Role>) -> GuardDecision {
    if state.loading {
        return GuardDecision::Pending;
    }
    if state.user.is_none() {
        return GuardDecision::RedirectToSignIn;
    }
    match required {
        Some(required) if !state.role().is_some_and(|role| role.allows(required)) => {
            GuardDecision::RedirectToDashboard
        }
        _ => GuardDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombeiro_auth::{Identity, Profile};
    use bombeiro_core::UserId;
    use chrono::Utc;

    fn signed_in(role: Option<Role>) -> AuthState {
        let user = Identity {
            id: UserId::new(),
            email: "u@example.com".to_string(),
            created_at: Utc::now(),
        };
        let profile = role.map(|role| Profile {
            user_id: user.id,
            name: "U".to_string(),
            email: user.email.clone(),
            avatar_url: None,
            role,
            rank: None,
            xp: None,
            achievements: None,
            daily_times: serde_json::Value::Null,
            created_at: None,
            updated_at: None,
        });
        AuthState {
            user: Some(user),
            session: None,
            profile,
            loading: false,
        }
    }

    #[test]
    fn settling_is_pending_regardless_of_requirement() {
        let state = AuthState::default();
        assert_eq!(guard(&state, None), GuardDecision::Pending);
        assert_eq!(guard(&state, Some(Role::KeyUser)), GuardDecision::Pending);
    }

    #[test]
    fn settled_without_user_redirects_to_sign_in() {
        let state = AuthState {
            loading: false,
            ..AuthState::default()
        };
        assert_eq!(guard(&state, None), GuardDecision::RedirectToSignIn);
    }

    #[test]
    fn editor_route_needs_key_user_privilege() {
        let required = Some(Role::KeyUser);
        assert_eq!(
            guard(&signed_in(None), required),
            GuardDecision::RedirectToDashboard
        );
        assert_eq!(
            guard(&signed_in(Some(Role::Standard)), required),
            GuardDecision::RedirectToDashboard
        );
        assert_eq!(guard(&signed_in(Some(Role::KeyUser)), required), GuardDecision::Allow);
        assert_eq!(guard(&signed_in(Some(Role::Admin)), required), GuardDecision::Allow);
    }

    #[test]
    fn plain_route_allows_any_signed_in_user() {
        assert_eq!(guard(&signed_in(None), None), GuardDecision::Allow);
        assert_eq!(guard(&signed_in(Some(Role::Standard)), None), GuardDecision::Allow);
    }
}
