//! REST implementation of [`BackendClient`] for the hosted API.
//!
//! Auth goes through `/auth/v1/*`, rows through `/rest/v1/{table}` with
//! `column=eq.value` filters. Requests carry the publishable key in the
//! `apikey` header and, once signed in, the session's bearer token.
//!
//! Auth-change notifications are synthesized client-side after successful
//! sign-in/sign-out, which matches how the hosted SDK dispatches them: the
//! server does not push over this transport.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use async_trait::async_trait;
use tokio::sync::RwLock;

use bombeiro_auth::{AuthChange, Identity, NewAccount, Session};
use bombeiro_core::UserId;

use crate::client::{BackendClient, Query};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::events::{AuthChannel, AuthSubscription};

/// Client for a hosted Supabase-style project.
pub struct RestBackend {
    http: reqwest::Client,
    config: BackendConfig,
    session: RwLock<Option<Session>>,
    channel: AuthChannel,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session: RwLock::new(None),
            channel: AuthChannel::new(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table)
    }

    /// Bearer token for data requests: the session token once signed in,
    /// the publishable key otherwise.
    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.config.anon_key.clone(),
        }
    }

    fn query_params(query: &Query) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = query
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}")))
            .collect();
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        params
    }

    async fn install_session(&self, session: Session) {
        *self.session.write().await = Some(session.clone());
        self.channel.publish(AuthChange::signed_in(session));
    }

    async fn send_rows(&self, req: reqwest::RequestBuilder) -> Result<Vec<Value>, BackendError> {
        let resp = req
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        if body.is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BackendClient for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.session.read().await.clone())
    }

    fn subscribe(&self) -> AuthSubscription {
        self.channel.subscribe()
    }

    async fn sign_up(&self, account: NewAccount) -> Result<Session, BackendError> {
        let body = serde_json::json!({
            "email": account.email,
            "password": account.password,
            "data": { "name": account.display_name },
        });

        let resp = self
            .http
            .post(self.auth_url("signup"))
            .query(&[("redirect_to", account.redirect_to.as_str())])
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let session = decode_session(resp).await?;
        self.install_session(session.clone()).await;
        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let body = serde_json::json!({ "email": email, "password": password });

        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let session = decode_session(resp).await?;
        self.install_session(session.clone()).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let token = self.bearer().await;
        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        *self.session.write().await = None;
        self.channel.publish(AuthChange::signed_out());
        Ok(())
    }

    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>, BackendError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(Self::query_params(&query));

        let req = self.http.get(self.table_url(table)).query(&params);
        self.send_rows(req).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        let req = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row);

        let mut rows = self.send_rows(req).await?;
        if rows.is_empty() {
            return Err(BackendError::Decode(
                "insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn update(
        &self,
        table: &str,
        query: Query,
        patch: Value,
    ) -> Result<Value, BackendError> {
        let req = self
            .http
            .patch(self.table_url(table))
            .query(&Self::query_params(&query))
            .header("Prefer", "return=representation")
            .json(&patch);

        let mut rows = self.send_rows(req).await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound);
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, table: &str, query: Query) -> Result<(), BackendError> {
        let req = self
            .http
            .delete(self.table_url(table))
            .query(&Self::query_params(&query));

        self.send_rows(req).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}

impl WireSession {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: Identity {
                id: UserId::from_uuid(self.user.id),
                email: self.user.email,
                created_at: self.user.created_at,
            },
        }
    }
}

async fn decode_session(resp: reqwest::Response) -> Result<Session, BackendError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    let wire: WireSession =
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(wire.into_session())
}

/// Pull the human-readable message out of an auth/REST error payload.
///
/// The auth endpoints use `error_description` or `msg`; PostgREST uses
/// `message`. Fall back to the raw body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    if body.is_empty() {
        "request failed".to_string()
    } else {
        body.to_string()
    }
}
