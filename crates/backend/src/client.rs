//! The backend client contract.
//!
//! Auth operations, the auth-change subscription, and generic row
//! query/mutation on named tables. Row payloads cross this boundary as
//! `serde_json::Value`; the typed layer above (`bombeiro-catalog`) owns
//! decoding.

use async_trait::async_trait;
use serde_json::Value;

use bombeiro_auth::{NewAccount, Session};

use crate::error::BackendError;
use crate::events::AuthSubscription;

/// Equality filters plus optional ordering for a row query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<(String, String)>,
    pub order: Option<OrderBy>,
}

/// Ordering of a `select` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter (`column = value`).
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending: false,
        });
        self
    }
}

/// The hosted backend-as-a-service, as seen from this client.
///
/// Implementations must be cheap to share (`Arc<dyn BackendClient>`); every
/// method is a single remote call with no retries — retry policy belongs to
/// callers that want one.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// One-shot pull of the session this client currently holds, if any.
    async fn current_session(&self) -> Result<Option<Session>, BackendError>;

    /// Push notifications for sign-in, sign-out and token refresh.
    ///
    /// Subscribe **before** calling [`Self::current_session`] so that no
    /// change landing between the probe request and its response is lost.
    fn subscribe(&self) -> AuthSubscription;

    /// Create an account. The profile row is produced by a backend-side
    /// trigger, not by this client.
    async fn sign_up(&self, account: NewAccount) -> Result<Session, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Fetch all rows of `table` matching `query`.
    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>, BackendError>;

    /// Fetch exactly one row; zero rows is [`BackendError::NotFound`], more
    /// than one is [`BackendError::UnexpectedRows`].
    async fn select_single(&self, table: &str, query: Query) -> Result<Value, BackendError> {
        let mut rows = self.select(table, query).await?;
        match rows.len() {
            0 => Err(BackendError::NotFound),
            1 => Ok(rows.remove(0)),
            n => Err(BackendError::UnexpectedRows(n)),
        }
    }

    /// Insert one row, returning the stored representation.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Patch all rows matching `query`, returning the first updated row.
    async fn update(
        &self,
        table: &str,
        query: Query,
        patch: Value,
    ) -> Result<Value, BackendError>;

    /// Delete all rows matching `query`.
    async fn delete(&self, table: &str, query: Query) -> Result<(), BackendError>;
}
