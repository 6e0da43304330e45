//! `bombeiro-auth` — authentication/authorization domain types.
//!
//! This crate is intentionally decoupled from HTTP and storage: it defines
//! who a user is (`Identity`, `Session`, `Profile`), what they may do
//! (`Role` with explicit privilege ordering), and the error taxonomy of the
//! auth boundary. The state machine that keeps these up to date lives in
//! `bombeiro-session`.

pub mod error;
pub mod profile;
pub mod role;
pub mod session;

pub use error::AuthError;
pub use profile::Profile;
pub use role::Role;
pub use session::{AuthChange, AuthEvent, Identity, NewAccount, Session};
