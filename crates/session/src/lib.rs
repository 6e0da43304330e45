//! `bombeiro-session` — the client-side auth/session/authorization core.
//!
//! [`SessionStore`] is the single source of truth for "who is logged in and
//! with what role". It reconciles two asynchronous initialization paths (the
//! pushed auth-change stream and the initial session probe) without
//! double-fetching or racing, and exposes the settled state every protected
//! surface guards on.

pub mod guard;
pub mod notify;
pub mod profile;
pub mod state;
pub mod store;

pub use guard::{GuardDecision, guard};
pub use notify::{Notification, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use profile::load_profile;
pub use state::AuthState;
pub use store::{SessionConfig, SessionStore};
