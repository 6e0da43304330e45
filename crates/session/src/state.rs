//! Observable auth state.

use bombeiro_auth::{Identity, Profile, Role, Session};

/// The state every protected surface reads.
///
/// Invariants:
/// - `loading` is `true` until the first of "no session exists" or "session
///   exists and the profile fetch completed" is established, and never
///   returns to `true` afterwards. Later auth changes update the other
///   fields in place.
/// - `profile.is_some()` implies `user.is_some()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<Identity>,
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            session: None,
            profile: None,
            loading: true,
        }
    }
}

impl AuthState {
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|profile| profile.role)
    }

    /// Editor privilege: `true` iff the profile role is `key_user` or
    /// `admin`. Absent profile means no privilege.
    pub fn is_key_user(&self) -> bool {
        self.role().is_some_and(|role| role.is_key_user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_settling_and_unauthenticated() {
        let state = AuthState::default();
        assert!(state.loading);
        assert!(state.user.is_none());
        assert!(!state.is_key_user());
    }
}
