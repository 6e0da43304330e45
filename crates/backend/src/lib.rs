//! `bombeiro-backend` — the hosted backend-as-a-service boundary.
//!
//! Everything "hard" (auth session lifecycle, row persistence, authorization
//! enforcement) happens on the other side of this boundary. This crate only
//! defines the contract ([`BackendClient`]), a REST implementation for the
//! hosted API ([`RestBackend`]), and an in-memory implementation for tests
//! and local development ([`MemoryBackend`]).

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod memory;
pub mod rest;

pub use client::{BackendClient, Query};
pub use config::BackendConfig;
pub use error::BackendError;
pub use events::{AuthChannel, AuthSubscription};
pub use memory::MemoryBackend;
pub use rest::RestBackend;
