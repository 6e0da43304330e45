//! User roles and privilege ordering.

use serde::{Deserialize, Serialize};

/// Role granted to a user's profile.
///
/// This is a closed set with a total privilege ordering:
/// `Admin` ⊇ `KeyUser` ⊇ `Standard`. Authorization checks compare privilege
/// with [`Role::allows`] instead of matching on individual variants, so
/// "admin is a superset of key-user" holds everywhere by construction.
///
/// Wire names match the backend enum (`standard`, `key_user`, `admin`).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular learner; can read the catalog and track their own progress.
    #[default]
    Standard,
    /// Content editor; can create/update/delete catalog entries.
    KeyUser,
    /// Full administrator; everything a key user can do, and more.
    Admin,
}

impl Role {
    /// Whether this role grants at least the privilege of `required`.
    pub fn allows(self, required: Role) -> bool {
        self >= required
    }

    /// Editor privilege (`key_user` or `admin`).
    pub fn is_key_user(self) -> bool {
        self.allows(Role::KeyUser)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::KeyUser => "key_user",
            Role::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_ordering_is_total() {
        assert!(Role::Admin > Role::KeyUser);
        assert!(Role::KeyUser > Role::Standard);
        assert!(Role::Admin.allows(Role::KeyUser));
        assert!(Role::Admin.allows(Role::Standard));
        assert!(Role::KeyUser.allows(Role::KeyUser));
        assert!(!Role::Standard.allows(Role::KeyUser));
    }

    #[test]
    fn key_user_privilege() {
        assert!(!Role::Standard.is_key_user());
        assert!(Role::KeyUser.is_key_user());
        assert!(Role::Admin.is_key_user());
    }

    #[test]
    fn wire_names_round_trip() {
        for role in [Role::Standard, Role::KeyUser, Role::Admin] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
    }
}
