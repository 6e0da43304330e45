//! Editor drafts for role-gated content mutations.
//!
//! Drafts validate the fields the editor forms require, then turn into the
//! row payload the backend stores. Saving a lesson derives the denormalized
//! `release_time` column from the release timestamp and mirrors the video
//! URL into the mindful slot, as the editor has always done.
//!
//! `release_time` is the UTC time-of-day slice of `release_timestamp`. The
//! browser editor used to slice the wall-clock time of whoever saved the
//! row; deriving in UTC keeps the column consistent with the timestamp it
//! denormalizes.

use chrono::{DateTime, Utc};
use serde_json::Value;

use bombeiro_core::{DomainError, DomainResult};

/// Draft of a lesson being created or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub description: String,
    pub module: String,
    /// Minutes; the form default.
    pub duration: i64,
    pub video_url: String,
    pub release_timestamp: DateTime<Utc>,
}

impl LessonDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description is required"));
        }
        if self.module.trim().is_empty() {
            return Err(DomainError::validation("module is required"));
        }
        Ok(())
    }

    pub(crate) fn into_row(self) -> Value {
        serde_json::json!({
            "title": self.title,
            "description": self.description,
            "module": self.module,
            "duration": self.duration,
            "video_url": self.video_url,
            "mindful_video_url": self.video_url,
            "release_timestamp": self.release_timestamp,
            "release_time": self.release_timestamp.format("%H:%M:%S").to_string(),
        })
    }
}

/// Draft of a mindful flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDraft {
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub video_url: String,
    pub release_timestamp: DateTime<Utc>,
}

impl FlowDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if self.video_url.trim().is_empty() {
            return Err(DomainError::validation("video URL is required"));
        }
        Ok(())
    }

    pub(crate) fn into_row(self) -> Value {
        serde_json::json!({
            "title": self.title,
            "description": self.description,
            "duration": self.duration,
            "video_url": self.video_url,
            "release_timestamp": self.release_timestamp,
            "release_time": self.release_timestamp.format("%H:%M:%S").to_string(),
        })
    }
}

/// Draft of a music track. Same shape as a flow, different table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDraft {
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub video_url: String,
    pub release_timestamp: DateTime<Utc>,
}

impl TrackDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if self.video_url.trim().is_empty() {
            return Err(DomainError::validation("video URL is required"));
        }
        Ok(())
    }

    pub(crate) fn into_row(self) -> Value {
        serde_json::json!({
            "title": self.title,
            "description": self.description,
            "duration": self.duration,
            "video_url": self.video_url,
            "release_timestamp": self.release_timestamp,
            "release_time": self.release_timestamp.format("%H:%M:%S").to_string(),
        })
    }
}
