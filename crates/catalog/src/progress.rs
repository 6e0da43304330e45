//! Dashboard progress aggregation.

use crate::rows::{FlowProgress, Lesson, LessonProgress, MindfulFlow, MusicProgress, MusicTrack};

/// Completed/total counts for one catalog area.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSummary {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Percentage in `0.0..=100.0`; an empty catalog reads as zero.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn lessons(lessons: &[Lesson], progress: &[LessonProgress]) -> Self {
        Self::new(
            progress.iter().filter(|p| p.completed()).count(),
            lessons.len(),
        )
    }

    pub fn flows(flows: &[MindfulFlow], progress: &[FlowProgress]) -> Self {
        Self::new(
            progress.iter().filter(|p| p.completed()).count(),
            flows.len(),
        )
    }

    pub fn music(tracks: &[MusicTrack], progress: &[MusicProgress]) -> Self {
        Self::new(
            progress.iter().filter(|p| p.completed()).count(),
            tracks.len(),
        )
    }
}
