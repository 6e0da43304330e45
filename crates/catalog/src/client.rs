//! The catalog query/mutation client.
//!
//! Thin typed layer over [`BackendClient`]: every method is one or two
//! backend calls plus decoding. Progress writes follow the pages' upsert
//! shape (update the existing row if there is one, insert otherwise).

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use bombeiro_auth::{Profile, Role};
use bombeiro_backend::{BackendClient, Query};
use bombeiro_core::{DomainError, FlowId, LessonId, TrackId, UserId};

use crate::editor::{FlowDraft, LessonDraft, TrackDraft};
use crate::error::CatalogError;
use crate::rows::{FlowProgress, Lesson, LessonProgress, MindfulFlow, MusicProgress, MusicTrack};

/// Profile-settings edits. At least one field must be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub daily_times: Option<Value>,
}

/// Typed client for the catalog and progress tables.
pub struct CatalogClient {
    backend: Arc<dyn BackendClient>,
}

impl CatalogClient {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    // ── Catalog reads ───────────────────────────────────────────────────

    /// All lessons, oldest release first.
    pub async fn list_lessons(&self) -> Result<Vec<Lesson>, CatalogError> {
        let rows = self
            .backend
            .select("lessons", Query::new().order_asc("release_timestamp"))
            .await?;
        decode_rows(rows)
    }

    pub async fn get_lesson(&self, id: LessonId) -> Result<Lesson, CatalogError> {
        let row = self
            .backend
            .select_single("lessons", Query::new().eq("id", id))
            .await?;
        decode(row)
    }

    pub async fn list_flows(&self) -> Result<Vec<MindfulFlow>, CatalogError> {
        let rows = self.backend.select("mindful_flows", Query::new()).await?;
        decode_rows(rows)
    }

    pub async fn get_flow(&self, id: FlowId) -> Result<MindfulFlow, CatalogError> {
        let row = self
            .backend
            .select_single("mindful_flows", Query::new().eq("id", id))
            .await?;
        decode(row)
    }

    pub async fn list_music(&self) -> Result<Vec<MusicTrack>, CatalogError> {
        let rows = self.backend.select("mindful_music", Query::new()).await?;
        decode_rows(rows)
    }

    pub async fn get_track(&self, id: TrackId) -> Result<MusicTrack, CatalogError> {
        let row = self
            .backend
            .select_single("mindful_music", Query::new().eq("id", id))
            .await?;
        decode(row)
    }

    // ── Progress ────────────────────────────────────────────────────────

    pub async fn lesson_progress(&self, user: UserId) -> Result<Vec<LessonProgress>, CatalogError> {
        let rows = self
            .backend
            .select("progress", Query::new().eq("user_id", user))
            .await?;
        decode_rows(rows)
    }

    pub async fn lesson_progress_for(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<LessonProgress>, CatalogError> {
        let rows = self
            .backend
            .select(
                "progress",
                Query::new().eq("user_id", user).eq("lesson_id", lesson),
            )
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn flow_progress(&self, user: UserId) -> Result<Vec<FlowProgress>, CatalogError> {
        let rows = self
            .backend
            .select("mindful_progress", Query::new().eq("user_id", user))
            .await?;
        decode_rows(rows)
    }

    pub async fn music_progress(&self, user: UserId) -> Result<Vec<MusicProgress>, CatalogError> {
        let rows = self
            .backend
            .select("music_progress", Query::new().eq("user_id", user))
            .await?;
        decode_rows(rows)
    }

    /// Mark the main lesson video as completed.
    pub async fn complete_lesson(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<LessonProgress, CatalogError> {
        let row = self
            .upsert_progress(
                "progress",
                Query::new().eq("user_id", user).eq("lesson_id", lesson),
                serde_json::json!({ "user_id": user, "lesson_id": lesson }),
                serde_json::json!({ "is_completed": true, "completed_at": Utc::now() }),
            )
            .await?;
        decode(row)
    }

    /// Mark the lesson's mindful companion video as completed.
    pub async fn complete_lesson_mindful(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<LessonProgress, CatalogError> {
        let row = self
            .upsert_progress(
                "progress",
                Query::new().eq("user_id", user).eq("lesson_id", lesson),
                serde_json::json!({ "user_id": user, "lesson_id": lesson }),
                serde_json::json!({ "mindful_completed": true }),
            )
            .await?;
        decode(row)
    }

    pub async fn complete_flow(
        &self,
        user: UserId,
        flow: FlowId,
    ) -> Result<FlowProgress, CatalogError> {
        let row = self
            .upsert_progress(
                "mindful_progress",
                Query::new().eq("user_id", user).eq("flow_id", flow),
                serde_json::json!({ "user_id": user, "flow_id": flow }),
                serde_json::json!({ "is_completed": true, "completed_at": Utc::now() }),
            )
            .await?;
        decode(row)
    }

    pub async fn complete_track(
        &self,
        user: UserId,
        track: TrackId,
    ) -> Result<MusicProgress, CatalogError> {
        let row = self
            .upsert_progress(
                "music_progress",
                Query::new().eq("user_id", user).eq("music_id", track),
                serde_json::json!({ "user_id": user, "music_id": track }),
                serde_json::json!({ "is_completed": true, "completed_at": Utc::now() }),
            )
            .await?;
        decode(row)
    }

    // ── Profile ─────────────────────────────────────────────────────────

    pub async fn get_profile(&self, user: UserId) -> Result<Profile, CatalogError> {
        let row = self
            .backend
            .select_single("profiles", Query::new().eq("user_id", user))
            .await?;
        decode(row)
    }

    pub async fn update_profile(
        &self,
        user: UserId,
        changes: ProfileChanges,
    ) -> Result<Profile, CatalogError> {
        let mut patch = serde_json::Map::new();
        if let Some(name) = changes.name {
            patch.insert("name".to_string(), Value::String(name));
        }
        if let Some(avatar_url) = changes.avatar_url {
            patch.insert("avatar_url".to_string(), Value::String(avatar_url));
        }
        if let Some(daily_times) = changes.daily_times {
            patch.insert("daily_times".to_string(), daily_times);
        }
        if patch.is_empty() {
            return Err(DomainError::validation("no profile changes").into());
        }
        patch.insert("updated_at".to_string(), serde_json::json!(Utc::now()));

        let row = self
            .backend
            .update(
                "profiles",
                Query::new().eq("user_id", user),
                Value::Object(patch),
            )
            .await?;
        decode(row)
    }

    // ── Editor mutations (role-gated) ───────────────────────────────────

    /// Create or update a lesson. Requires key-user privilege.
    pub async fn save_lesson(
        &self,
        role: Option<Role>,
        existing: Option<LessonId>,
        draft: LessonDraft,
    ) -> Result<Lesson, CatalogError> {
        require_editor(role)?;
        draft.validate()?;
        let row = match existing {
            Some(id) => {
                self.backend
                    .update("lessons", Query::new().eq("id", id), draft.into_row())
                    .await?
            }
            None => self.backend.insert("lessons", draft.into_row()).await?,
        };
        decode(row)
    }

    pub async fn delete_lesson(
        &self,
        role: Option<Role>,
        id: LessonId,
    ) -> Result<(), CatalogError> {
        require_editor(role)?;
        self.backend
            .delete("lessons", Query::new().eq("id", id))
            .await?;
        Ok(())
    }

    pub async fn save_flow(
        &self,
        role: Option<Role>,
        existing: Option<FlowId>,
        draft: FlowDraft,
    ) -> Result<MindfulFlow, CatalogError> {
        require_editor(role)?;
        draft.validate()?;
        let row = match existing {
            Some(id) => {
                self.backend
                    .update("mindful_flows", Query::new().eq("id", id), draft.into_row())
                    .await?
            }
            None => self.backend.insert("mindful_flows", draft.into_row()).await?,
        };
        decode(row)
    }

    pub async fn delete_flow(&self, role: Option<Role>, id: FlowId) -> Result<(), CatalogError> {
        require_editor(role)?;
        self.backend
            .delete("mindful_flows", Query::new().eq("id", id))
            .await?;
        Ok(())
    }

    pub async fn save_track(
        &self,
        role: Option<Role>,
        existing: Option<TrackId>,
        draft: TrackDraft,
    ) -> Result<MusicTrack, CatalogError> {
        require_editor(role)?;
        draft.validate()?;
        let row = match existing {
            Some(id) => {
                self.backend
                    .update("mindful_music", Query::new().eq("id", id), draft.into_row())
                    .await?
            }
            None => self.backend.insert("mindful_music", draft.into_row()).await?,
        };
        decode(row)
    }

    pub async fn delete_track(&self, role: Option<Role>, id: TrackId) -> Result<(), CatalogError> {
        require_editor(role)?;
        self.backend
            .delete("mindful_music", Query::new().eq("id", id))
            .await?;
        Ok(())
    }

    /// Update the row matching `query` if one exists, insert otherwise.
    async fn upsert_progress(
        &self,
        table: &str,
        query: Query,
        base: Value,
        patch: Value,
    ) -> Result<Value, CatalogError> {
        let existing = self.backend.select(table, query).await?;
        let existing_id = existing
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .map(ToString::to_string);

        let row = match existing_id {
            Some(id) => {
                self.backend
                    .update(table, Query::new().eq("id", id), patch)
                    .await?
            }
            None => {
                let mut row = base;
                if let (Some(target), Some(extra)) = (row.as_object_mut(), patch.as_object()) {
                    for (key, value) in extra {
                        target.insert(key.clone(), value.clone());
                    }
                }
                self.backend.insert(table, row).await?
            }
        };
        Ok(row)
    }
}

fn require_editor(role: Option<Role>) -> Result<(), CatalogError> {
    if role.is_some_and(|role| role.allows(Role::KeyUser)) {
        Ok(())
    } else {
        Err(CatalogError::unauthorized())
    }
}

fn decode<T: DeserializeOwned>(row: Value) -> Result<T, CatalogError> {
    serde_json::from_value(row).map_err(|e| CatalogError::Decode(e.to_string()))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, CatalogError> {
    rows.into_iter().map(decode).collect()
}
