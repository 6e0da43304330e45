//! `bombeiro-catalog` — typed data layer for the learning catalog.
//!
//! Lessons, mindful flows, music tracks, per-user progress and profile
//! edits, decoded from the raw rows the backend boundary returns. Editor
//! mutations are role-gated here (privilege ordering, not string checks);
//! the backend still enforces its own row-level rules.

pub mod client;
pub mod editor;
pub mod error;
pub mod progress;
pub mod rows;

pub use client::{CatalogClient, ProfileChanges};
pub use editor::{FlowDraft, LessonDraft, TrackDraft};
pub use error::CatalogError;
pub use progress::ProgressSummary;
pub use rows::{FlowProgress, Lesson, LessonProgress, MindfulFlow, MusicProgress, MusicTrack};
