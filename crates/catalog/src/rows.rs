//! Typed table rows.
//!
//! Nullable columns stay `Option` here; accessors flatten the ones pages
//! treat as plain booleans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bombeiro_core::{FlowId, LessonId, ProgressId, TrackId, UserId};

/// A lesson in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<i64>,
    pub video_url: String,
    #[serde(default)]
    pub mindful_video_url: Option<String>,
    #[serde(default)]
    pub release_timestamp: Option<DateTime<Utc>>,
    /// Time-of-day slice of the release timestamp, kept denormalized by the
    /// editor.
    #[serde(default)]
    pub release_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Lesson {
    /// A lesson with no release timestamp is treated as already released.
    pub fn is_released(&self, now: DateTime<Utc>) -> bool {
        self.release_timestamp.is_none_or(|at| at <= now)
    }
}

/// A mindfulness-flow session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindfulFlow {
    pub id: FlowId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    pub video_url: String,
    #[serde(default)]
    pub release_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub release_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A music session track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub id: TrackId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    pub video_url: String,
    #[serde(default)]
    pub release_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub release_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-user progress on a lesson (main video plus its mindful companion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub id: ProgressId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub mindful_completed: Option<bool>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    pub fn completed(&self) -> bool {
        self.is_completed.unwrap_or(false)
    }

    pub fn mindful_done(&self) -> bool {
        self.mindful_completed.unwrap_or(false)
    }
}

/// Per-user progress on a mindful flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowProgress {
    pub id: ProgressId,
    pub user_id: UserId,
    pub flow_id: FlowId,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FlowProgress {
    pub fn completed(&self) -> bool {
        self.is_completed.unwrap_or(false)
    }
}

/// Per-user progress on a music track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicProgress {
    pub id: ProgressId,
    pub user_id: UserId,
    pub music_id: TrackId,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl MusicProgress {
    pub fn completed(&self) -> bool {
        self.is_completed.unwrap_or(false)
    }
}
