//! The session store state machine.
//!
//! Two asynchronous inputs feed the store: the pushed auth-change stream and
//! the one-shot probe for an existing session. Both funnel through the same
//! reconcile routine on a single store-owned task, so they never interleave
//! destructively. The subscription is taken **before** the probe, so a
//! change landing between the probe request and its response is not lost.
//!
//! Profile fetches are deferred to a detached task. The ordering contract is
//! first-class: a spawned task runs only after the current callback has
//! fully returned, so the backend client is never re-entered from inside its
//! own event dispatch. A resolving fetch re-checks that its identity is
//! still the current one before touching state, which keeps a sign-out (or a
//! user switch) during an in-flight fetch from resurrecting stale data.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use bombeiro_auth::{AuthError, NewAccount, Session};
use bombeiro_backend::BackendClient;
use bombeiro_core::UserId;

use crate::notify::{Notification, Notifier};
use crate::profile::load_profile;
use crate::state::AuthState;

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Where the backend sends a new user after e-mail confirmation.
    pub redirect_to: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redirect_to: "/".to_string(),
        }
    }
}

/// Single source of truth for "who is logged in and with what role".
///
/// Construct one per application lifecycle with [`SessionStore::start`];
/// dropping it (or calling [`SessionStore::shutdown`]) releases the
/// subscription, after which no further state mutation occurs.
pub struct SessionStore {
    inner: Arc<Inner>,
    events_task: JoinHandle<()>,
}

struct Inner {
    backend: Arc<dyn BackendClient>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
    state_tx: watch::Sender<AuthState>,
    /// Identity a profile fetch is currently in flight for. Guards against
    /// scheduling two fetches for the same identity in one settle cycle.
    pending_fetch: Mutex<Option<UserId>>,
}

impl SessionStore {
    pub fn start(backend: Arc<dyn BackendClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_config(backend, notifier, SessionConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn BackendClient>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::default());
        let inner = Arc::new(Inner {
            backend,
            notifier,
            config,
            state_tx,
            pending_fetch: Mutex::new(None),
        });

        // Subscribe first, then probe.
        let mut changes = inner.backend.subscribe();
        let weak = Arc::downgrade(&inner);
        let events_task = tokio::spawn(async move {
            if let Some(inner) = weak.upgrade() {
                let snapshot = match inner.backend.current_session().await {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        tracing::warn!(error = %err, "session probe failed, settling signed out");
                        None
                    }
                };
                Inner::reconcile(&inner, snapshot);
            }

            while let Some(change) = changes.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                tracing::debug!(event = ?change.event, "auth change");
                Inner::reconcile(&inner, change.session);
            }
        });

        Self { inner, events_task }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.inner.state_tx.borrow().clone()
    }

    /// Live view of the state for consumers that re-render on change.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    /// Wait for the initial settle (first `loading == false`).
    pub async fn settled(&self) -> AuthState {
        let mut rx = self.watch();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Editor privilege of the current profile.
    pub fn is_key_user(&self) -> bool {
        self.inner.state_tx.borrow().is_key_user()
    }

    /// Create an account. The resulting state update arrives through the
    /// auth-change stream, not through this return value.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError> {
        let account = NewAccount {
            email: email.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            redirect_to: self.inner.config.redirect_to.clone(),
        };

        match self.inner.backend.sign_up(account).await {
            Ok(session) => {
                self.inner.notifier.notify(Notification::info(
                    "Conta criada!",
                    "Bem-vindo ao Bombeiro Bilíngue, Cadete!",
                ));
                Ok(session)
            }
            Err(err) => {
                let err = AuthError::from(err);
                self.inner
                    .notifier
                    .notify(Notification::error("Erro ao criar conta", err.message()));
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        match self
            .inner
            .backend
            .sign_in_with_password(email, password)
            .await
        {
            Ok(session) => {
                self.inner.notifier.notify(Notification::info(
                    "Bem-vindo de volta!",
                    "Pronto para a próxima missão?",
                ));
                Ok(session)
            }
            Err(err) => {
                let err = AuthError::from(err);
                self.inner
                    .notifier
                    .notify(Notification::error("Erro ao entrar", err.message()));
                Err(err)
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self.inner.backend.sign_out().await {
            Ok(()) => Ok(()),
            Err(err) => {
                let err = AuthError::from(err);
                self.inner
                    .notifier
                    .notify(Notification::error("Erro ao sair", err.message()));
                Err(err)
            }
        }
    }

    /// Release the auth-change subscription. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.events_task.abort();
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.events_task.abort();
    }
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, Option<UserId>> {
        self.pending_fetch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Single reconciliation routine for both the initial probe and pushed
    /// changes. Session/user are applied synchronously; the profile fetch is
    /// deferred off this callback.
    fn reconcile(inner: &Arc<Inner>, session: Option<Session>) {
        match session {
            Some(session) => {
                let user = session.user.clone();
                inner.state_tx.send_modify(|state| {
                    state.user = Some(user.clone());
                    state.session = Some(session);
                });
                Inner::schedule_profile_fetch(inner, user.id);
            }
            None => {
                *inner.pending() = None;
                inner.state_tx.send_modify(|state| {
                    state.user = None;
                    state.session = None;
                    state.profile = None;
                    state.loading = false;
                });
            }
        }
    }

    fn schedule_profile_fetch(inner: &Arc<Inner>, user_id: UserId) {
        {
            let mut pending = inner.pending();
            if *pending == Some(user_id) {
                // A fetch for this identity is already in flight and will
                // settle this cycle too.
                return;
            }
            *pending = Some(user_id);
        }

        let weak = Arc::downgrade(inner);
        tokio::spawn(async move {
            let profile = match weak.upgrade() {
                Some(inner) => load_profile(inner.backend.as_ref(), user_id).await,
                None => return,
            };

            // The store may have been torn down while the fetch was in
            // flight; resolving then is a no-op.
            let Some(inner) = weak.upgrade() else { return };

            {
                let mut pending = inner.pending();
                if *pending == Some(user_id) {
                    *pending = None;
                }
            }

            inner.state_tx.send_if_modified(|state| {
                // Stale guard: apply only if this identity is still the
                // current one.
                let current = state.user.as_ref().is_some_and(|user| user.id == user_id);
                if !current {
                    tracing::debug!(%user_id, "discarding out-of-date profile fetch");
                    return false;
                }
                state.profile = profile;
                state.loading = false;
                true
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bombeiro_auth::{AuthChange, AuthEvent, Identity, Role};
    use bombeiro_backend::MemoryBackend;

    use crate::guard::{GuardDecision, guard};
    use crate::notify::{RecordingNotifier, Severity};

    fn seed_profile(backend: &MemoryBackend, user: &Identity, role: &str) {
        backend.seed_row(
            "profiles",
            serde_json::json!({
                "user_id": user.id,
                "name": "Firefighter",
                "email": user.email,
                "role": role,
            }),
        );
    }

    fn store(backend: &Arc<MemoryBackend>) -> (SessionStore, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = SessionStore::start(backend.clone(), notifier.clone());
        (store, notifier)
    }

    // No existing session settles promptly, with no profile fetch.
    #[tokio::test]
    async fn no_session_settles_without_profile_fetch() {
        let backend = Arc::new(MemoryBackend::new());
        let (store, _) = store(&backend);

        let state = store.settled().await;
        assert!(!state.loading);
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert_eq!(backend.select_calls("profiles"), 0);
    }

    // With an existing session, loading holds until the profile fetch
    // resolves, then the role is available.
    #[tokio::test(start_paused = true)]
    async fn existing_session_blocks_until_profile_resolves() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("chief@cbmsp.br", "pw");
        backend.open_session("chief@cbmsp.br");
        seed_profile(&backend, &user, "admin");
        backend.delay_select_on("profiles", Duration::from_millis(50));

        let (store, _) = store(&backend);

        // The session lands synchronously in the reconcile; the profile is
        // still in flight, so the store has not settled.
        let mut rx = store.watch();
        let pre = rx
            .wait_for(|state| state.user.is_some())
            .await
            .map(|state| state.clone())
            .ok();
        let pre = pre.expect("session applied");
        assert!(pre.loading);
        assert!(pre.profile.is_none());

        let state = store.settled().await;
        assert!(!state.loading);
        assert_eq!(state.user.as_ref().map(|u| u.id), Some(user.id));
        assert_eq!(state.role(), Some(Role::Admin));
        assert!(state.is_key_user());
    }

    // A failed profile fetch still settles.
    #[tokio::test]
    async fn profile_fetch_failure_still_settles() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("u@example.com", "pw");
        backend.open_session("u@example.com");
        backend.fail_select_on("profiles", "permission denied");

        let (store, _) = store(&backend);

        let state = store.settled().await;
        assert!(!state.loading);
        assert!(state.user.is_some());
        assert!(state.profile.is_none());
        assert!(!state.is_key_user());
    }

    // A sign-out push after settle clears everything without
    // re-asserting loading.
    #[tokio::test]
    async fn sign_out_event_clears_state_without_reloading() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("u@example.com", "pw");
        backend.open_session("u@example.com");
        seed_profile(&backend, &user, "key_user");

        let (store, _) = store(&backend);
        let settled = store.settled().await;
        assert!(settled.profile.is_some());

        let mut rx = store.watch();
        backend.publish(AuthChange::signed_out());

        loop {
            rx.changed().await.unwrap();
            let state = rx.borrow().clone();
            // loading never re-asserts after the first settle
            assert!(!state.loading);
            if state.user.is_none() {
                assert!(state.session.is_none());
                assert!(state.profile.is_none());
                break;
            }
        }
    }

    // The initial probe plus a push for the same session must not
    // trigger two profile fetches within one settle cycle.
    #[tokio::test]
    async fn probe_and_push_share_one_profile_fetch() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("u@example.com", "pw");
        let session = backend.open_session("u@example.com").unwrap();
        seed_profile(&backend, &user, "standard");

        let (store, _) = store(&backend);
        backend.publish(AuthChange {
            event: AuthEvent::TokenRefreshed,
            session: Some(session),
        });

        let state = store.settled().await;
        assert!(state.profile.is_some());
        assert_eq!(backend.select_calls("profiles"), 1);
    }

    // One sign-in, one push, one fetch.
    #[tokio::test]
    async fn sign_in_triggers_exactly_one_profile_fetch() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("u@example.com", "pw");
        seed_profile(&backend, &user, "standard");

        let (store, notifier) = store(&backend);
        assert!(store.settled().await.user.is_none());

        store.sign_in("u@example.com", "pw").await.unwrap();

        let mut rx = store.watch();
        let state = rx
            .wait_for(|state| state.profile.is_some())
            .await
            .map(|state| state.clone())
            .unwrap();
        assert_eq!(state.user.as_ref().map(|u| u.id), Some(user.id));
        assert_eq!(backend.select_calls("profiles"), 1);

        let notes = notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Info);
        assert_eq!(notes[0].title, "Bem-vindo de volta!");
    }

    // Failures resolve to typed errors, never panics, with exactly one
    // notification per call.
    #[tokio::test]
    async fn auth_failures_notify_exactly_once_per_call() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_auth("Invalid login credentials");

        let (store, notifier) = store(&backend);

        let err = store.sign_in("u@example.com", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Invalid login credentials".to_string()));
        assert_eq!(notifier.count(), 1);

        store.sign_up("u@example.com", "pw", "U").await.unwrap_err();
        assert_eq!(notifier.count(), 2);

        store.sign_out().await.unwrap_err();
        assert_eq!(notifier.count(), 3);

        let notes = notifier.take();
        assert!(notes.iter().all(|n| n.severity == Severity::Error));
        assert_eq!(notes[0].title, "Erro ao entrar");
        assert_eq!(notes[1].title, "Erro ao criar conta");
        assert_eq!(notes[2].title, "Erro ao sair");
    }

    // Sign-up success: welcome notification, and the trigger-created
    // profile flows back with the standard role.
    #[tokio::test]
    async fn sign_up_welcomes_and_picks_up_trigger_profile() {
        let backend = Arc::new(MemoryBackend::new());
        let (store, notifier) = store(&backend);
        assert!(store.settled().await.user.is_none());

        let session = store
            .sign_up("cadet@cbmsp.br", "pw", "Cadete Silva")
            .await
            .unwrap();
        assert_eq!(session.user.email, "cadet@cbmsp.br");

        let mut rx = store.watch();
        let state = rx
            .wait_for(|state| state.profile.is_some())
            .await
            .map(|state| state.clone())
            .unwrap();
        assert_eq!(state.role(), Some(Role::Standard));
        assert!(!state.is_key_user());

        let notes = notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Conta criada!");
    }

    // Scenario: sign-out while the profile fetch for the previous identity
    // is still in flight; its resolution must not resurrect stale state.
    #[tokio::test(start_paused = true)]
    async fn inflight_fetch_does_not_overwrite_signed_out_state() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("u@example.com", "pw");
        backend.open_session("u@example.com");
        seed_profile(&backend, &user, "admin");
        backend.delay_select_on("profiles", Duration::from_secs(5));

        let (store, _) = store(&backend);

        // Let the reconcile run and the fetch go in flight.
        let mut rx = store.watch();
        rx.wait_for(|state| state.user.is_some()).await.unwrap();

        backend.publish(AuthChange::signed_out());
        let state = store.settled().await;
        assert!(state.user.is_none());

        // Let the delayed fetch resolve; it must be discarded.
        tokio::time::sleep(Duration::from_secs(6)).await;
        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(!state.loading);
    }

    // Scenario: no profile row -> no privilege, editor route redirects.
    #[tokio::test]
    async fn missing_profile_means_no_editor_access() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("u1@example.com", "pw");
        backend.open_session("u1@example.com");

        let (store, _) = store(&backend);
        let state = store.settled().await;

        assert!(state.profile.is_none());
        assert!(!state.is_key_user());
        assert_eq!(
            guard(&state, Some(Role::KeyUser)),
            GuardDecision::RedirectToDashboard
        );
    }

    // Scenario: admin profile -> editor route renders.
    #[tokio::test]
    async fn admin_profile_grants_editor_access() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("u2@example.com", "pw");
        backend.open_session("u2@example.com");
        seed_profile(&backend, &user, "admin");

        let (store, _) = store(&backend);
        let state = store.settled().await;

        assert!(state.is_key_user());
        assert_eq!(guard(&state, Some(Role::KeyUser)), GuardDecision::Allow);
    }

    // Teardown: no state mutation after shutdown.
    #[tokio::test]
    async fn shutdown_releases_the_subscription() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register_user("u@example.com", "pw");
        seed_profile(&backend, &user, "admin");

        let (store, _) = store(&backend);
        assert!(store.settled().await.user.is_none());

        store.shutdown();
        tokio::task::yield_now().await;

        backend
            .sign_in_with_password("u@example.com", "pw")
            .await
            .unwrap();
        tokio::task::yield_now().await;

        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
    }
}
