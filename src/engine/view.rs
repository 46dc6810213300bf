// src/engine/view.rs

//! Render-state snapshot exposed to the host UI.
//!
//! The supervisor owns all state; this module is the structured projection a
//! renderer needs. Presentation (layout, styling, dialogs) is entirely the
//! host's concern.

use std::time::Duration;

use crate::engine::record::OutputLine;
use crate::engine::TaskId;
use crate::types::RunStatus;

/// Maximum per-record status glyphs shown in the minimized aggregate before
/// collapsing into an overflow count.
pub const MAX_STATUS_GLYPHS: usize = 10;

/// One entry of the tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel {
    pub id: TaskId,
    pub title: String,
    pub status: RunStatus,
}

/// Content of the active tab.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveContent {
    pub id: TaskId,
    pub title: String,
    pub model: Option<String>,
    pub status: RunStatus,
    pub lines: Vec<OutputLine>,
    /// Lines back from the newest line; 0 means pinned to the bottom.
    pub scroll_back: usize,
    pub elapsed: Duration,
}

/// Compact aggregate rendered instead of full content while minimized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimizedSummary {
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Per-record status glyphs in record order, capped at
    /// [`MAX_STATUS_GLYPHS`] entries.
    pub glyphs: String,
    /// How many records did not fit into `glyphs`.
    pub overflow: usize,
}

impl MinimizedSummary {
    pub fn from_statuses(statuses: &[RunStatus]) -> Self {
        let mut summary = Self {
            running: 0,
            completed: 0,
            failed: 0,
            cancelled: 0,
            glyphs: String::new(),
            overflow: statuses.len().saturating_sub(MAX_STATUS_GLYPHS),
        };

        for (i, status) in statuses.iter().enumerate() {
            match status {
                RunStatus::Running => summary.running += 1,
                RunStatus::Completed => summary.completed += 1,
                RunStatus::Failed => summary.failed += 1,
                RunStatus::Cancelled => summary.cancelled += 1,
            }
            if i < MAX_STATUS_GLYPHS {
                summary.glyphs.push(status_glyph(*status));
            }
        }

        summary
    }
}

/// Glyph used for one record in the minimized aggregate.
pub fn status_glyph(status: RunStatus) -> char {
    match status {
        RunStatus::Running => '●',
        RunStatus::Completed => '✓',
        RunStatus::Failed => '✗',
        RunStatus::Cancelled => '⊘',
    }
}

/// Open cancellation confirmation, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCancel {
    pub index: usize,
    pub id: TaskId,
    pub title: String,
    pub elapsed: Duration,
}

/// Full render-state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TabsView {
    pub tabs: Vec<TabLabel>,
    pub active: Option<usize>,
    /// First tab index visible in the tab strip window.
    pub tab_scroll: usize,
    pub minimized: bool,
    /// Present when not minimized and at least one record exists.
    pub content: Option<ActiveContent>,
    /// Present while minimized.
    pub summary: Option<MinimizedSummary>,
    pub pending_cancel: Option<PendingCancel>,
    /// False while any record is Running.
    pub exit_permitted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_status() {
        let statuses = [
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Completed,
            RunStatus::Cancelled,
        ];
        let summary = MinimizedSummary::from_statuses(&statuses);
        assert_eq!(summary.running, 1);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.overflow, 0);
        assert_eq!(summary.glyphs.chars().count(), 5);
    }

    #[test]
    fn summary_caps_glyphs_with_overflow_marker() {
        let statuses = vec![RunStatus::Completed; MAX_STATUS_GLYPHS + 3];
        let summary = MinimizedSummary::from_statuses(&statuses);
        assert_eq!(summary.glyphs.chars().count(), MAX_STATUS_GLYPHS);
        assert_eq!(summary.overflow, 3);
        assert_eq!(summary.completed, MAX_STATUS_GLYPHS + 3);
    }
}
