//! In-memory backend for tests and local development.
//!
//! Keeps accounts and tables in process memory, fans auth changes out
//! through an [`AuthChannel`], and offers failure/latency injection so the
//! session state machine can be exercised deterministically.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use async_trait::async_trait;

use bombeiro_auth::{AuthChange, Identity, NewAccount, Session};
use bombeiro_core::UserId;

use crate::client::{BackendClient, Query};
use crate::error::BackendError;
use crate::events::{AuthChannel, AuthSubscription};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: Identity,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    tables: HashMap<String, Vec<Value>>,
    current: Option<Session>,
    select_calls: HashMap<String, usize>,
    failing_selects: HashMap<String, String>,
    select_delays: HashMap<String, Duration>,
    auth_failure: Option<String>,
}

/// In-memory [`BackendClient`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    channel: AuthChannel,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an account without signing it in.
    pub fn register_user(&self, email: &str, password: &str) -> Identity {
        let user = Identity {
            id: UserId::new(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    /// Install a session for an already registered account, as if it had
    /// been persisted from an earlier run. No auth change is published.
    pub fn open_session(&self, email: &str) -> Option<Session> {
        let mut state = self.lock();
        let user = state.accounts.get(email)?.user.clone();
        let session = mint_session(user);
        state.current = Some(session.clone());
        Some(session)
    }

    pub fn seed_row(&self, table: &str, row: Value) {
        self.lock().tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Push an auth change to all subscribers.
    pub fn publish(&self, change: AuthChange) {
        self.channel.publish(change);
    }

    /// Number of `select` calls issued against `table`.
    pub fn select_calls(&self, table: &str) -> usize {
        self.lock().select_calls.get(table).copied().unwrap_or(0)
    }

    /// Make every `select` on `table` fail with an API error.
    pub fn fail_select_on(&self, table: &str, message: &str) {
        self.lock()
            .failing_selects
            .insert(table.to_string(), message.to_string());
    }

    /// Delay every `select` on `table`, creating an observable in-flight
    /// window for race tests.
    pub fn delay_select_on(&self, table: &str, delay: Duration) {
        self.lock().select_delays.insert(table.to_string(), delay);
    }

    /// Make the next auth operations fail with `message`.
    pub fn fail_auth(&self, message: &str) {
        self.lock().auth_failure = Some(message.to_string());
    }

    fn auth_failure(&self) -> Option<BackendError> {
        self.lock().auth_failure.as_ref().map(|message| BackendError::Api {
            status: 400,
            message: message.clone(),
        })
    }
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.lock().current.clone())
    }

    fn subscribe(&self) -> AuthSubscription {
        self.channel.subscribe()
    }

    async fn sign_up(&self, account: NewAccount) -> Result<Session, BackendError> {
        if let Some(err) = self.auth_failure() {
            return Err(err);
        }

        let session = {
            let mut state = self.lock();
            if state.accounts.contains_key(&account.email) {
                return Err(BackendError::Api {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }

            let user = Identity {
                id: UserId::new(),
                email: account.email.clone(),
                created_at: Utc::now(),
            };
            state.accounts.insert(
                account.email.clone(),
                Account {
                    password: account.password.clone(),
                    user: user.clone(),
                },
            );

            // Stand-in for the backend-side trigger that creates the
            // profile row at sign-up.
            state
                .tables
                .entry("profiles".to_string())
                .or_default()
                .push(serde_json::json!({
                    "user_id": user.id,
                    "name": account.display_name,
                    "email": account.email,
                    "role": "standard",
                }));

            let session = mint_session(user);
            state.current = Some(session.clone());
            session
        };

        self.channel.publish(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        if let Some(err) = self.auth_failure() {
            return Err(err);
        }

        let session = {
            let mut state = self.lock();
            let account = state.accounts.get(email).cloned();
            match account {
                Some(account) if account.password == password => {
                    let session = mint_session(account.user);
                    state.current = Some(session.clone());
                    session
                }
                _ => {
                    return Err(BackendError::Api {
                        status: 400,
                        message: "Invalid login credentials".to_string(),
                    });
                }
            }
        };

        self.channel.publish(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if let Some(err) = self.auth_failure() {
            return Err(err);
        }

        self.lock().current = None;
        self.channel.publish(AuthChange::signed_out());
        Ok(())
    }

    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>, BackendError> {
        let delay = {
            let mut state = self.lock();
            *state.select_calls.entry(table.to_string()).or_insert(0) += 1;
            state.select_delays.get(table).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        if let Some(message) = state.failing_selects.get(table) {
            return Err(BackendError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filters(row, &query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let a = field_as_string(a, &order.column);
                let b = field_as_string(b, &order.column);
                if order.ascending { a.cmp(&b) } else { b.cmp(&a) }
            });
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value, BackendError> {
        if let Some(object) = row.as_object_mut() {
            object
                .entry("id")
                .or_insert_with(|| Value::String(Uuid::now_v7().to_string()));
        }
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        query: Query,
        patch: Value,
    ) -> Result<Value, BackendError> {
        let mut state = self.lock();
        let rows = state.tables.entry(table.to_string()).or_default();

        let mut updated = None;
        for row in rows.iter_mut().filter(|row| matches_filters(row, &query)) {
            if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
            if updated.is_none() {
                updated = Some(row.clone());
            }
        }

        updated.ok_or(BackendError::NotFound)
    }

    async fn delete(&self, table: &str, query: Query) -> Result<(), BackendError> {
        let mut state = self.lock();
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !matches_filters(row, &query));
        }
        Ok(())
    }
}

fn mint_session(user: Identity) -> Session {
    Session {
        access_token: Uuid::now_v7().to_string(),
        refresh_token: Uuid::now_v7().to_string(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        user,
    }
}

fn field_as_string(row: &Value, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn matches_filters(row: &Value, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|(column, value)| field_as_string(row, column) == *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombeiro_auth::AuthEvent;

    #[tokio::test]
    async fn sign_in_publishes_and_sets_current_session() {
        let backend = MemoryBackend::new();
        backend.register_user("alice@example.com", "hunter2");
        let mut sub = backend.subscribe();

        let session = backend
            .sign_in_with_password("alice@example.com", "hunter2")
            .await
            .unwrap();

        let change = sub.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedIn);
        assert_eq!(change.session.unwrap().user.id, session.user.id);
        assert!(backend.current_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_password() {
        let backend = MemoryBackend::new();
        backend.register_user("alice@example.com", "hunter2");

        let err = backend
            .sign_in_with_password("alice@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn sign_up_creates_profile_row() {
        let backend = MemoryBackend::new();
        let session = backend
            .sign_up(NewAccount {
                email: "bob@example.com".to_string(),
                password: "pw".to_string(),
                display_name: "Bob".to_string(),
                redirect_to: "https://app.example/".to_string(),
            })
            .await
            .unwrap();

        let profiles = backend
            .select("profiles", Query::new().eq("user_id", session.user.id))
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["role"], "standard");
    }

    #[tokio::test]
    async fn select_single_semantics() {
        let backend = MemoryBackend::new();
        backend.seed_row("lessons", serde_json::json!({"id": "a", "title": "One"}));

        let err = backend
            .select_single("lessons", Query::new().eq("id", "missing"))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::NotFound);

        let row = backend
            .select_single("lessons", Query::new().eq("id", "a"))
            .await
            .unwrap();
        assert_eq!(row["title"], "One");
    }

    #[tokio::test]
    async fn update_patches_matching_row() {
        let backend = MemoryBackend::new();
        backend.seed_row(
            "progress",
            serde_json::json!({"id": "p1", "user_id": "u1", "is_completed": false}),
        );

        let updated = backend
            .update(
                "progress",
                Query::new().eq("id", "p1"),
                serde_json::json!({"is_completed": true}),
            )
            .await
            .unwrap();
        assert_eq!(updated["is_completed"], true);
        assert_eq!(backend.rows("progress")[0]["is_completed"], true);
    }

    #[tokio::test]
    async fn select_orders_rows() {
        let backend = MemoryBackend::new();
        backend.seed_row("lessons", serde_json::json!({"id": "b", "release_timestamp": "2025-02-01T00:00:00Z"}));
        backend.seed_row("lessons", serde_json::json!({"id": "a", "release_timestamp": "2025-01-01T00:00:00Z"}));

        let rows = backend
            .select("lessons", Query::new().order_asc("release_timestamp"))
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], "a");
        assert_eq!(rows[1]["id"], "b");

        let rows = backend
            .select("lessons", Query::new().order_desc("release_timestamp"))
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], "b");
        assert_eq!(rows[1]["id"], "a");
    }
}
