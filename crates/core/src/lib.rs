//! `bombeiro-core` — shared domain foundation for the Bombeiro Bilíngue client.
//!
//! Strongly-typed identifiers and the domain error model. No IO, no async.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{FlowId, LessonId, ProgressId, TrackId, UserId};
