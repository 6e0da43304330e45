//! The application-level profile row extending an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bombeiro_core::UserId;

use crate::Role;

/// One-to-one extension of an identity: display data plus the authorization
/// role. Created by a backend trigger at sign-up; edited via profile
/// settings; never deleted by this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Gamification: current rank label ("Cadete", ...).
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub achievements: Option<Vec<String>>,
    /// Per-weekday study-time preferences, schema owned by the backend.
    #[serde(default)]
    pub daily_times: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Editor privilege shortcut used by route guards and editor mutations.
    pub fn is_key_user(&self) -> bool {
        self.role.is_key_user()
    }
}
