// src/engine/record.rs

//! Per-run record: buffered output, status state machine, scroll state.

use std::time::Duration;

use tokio::time::Instant;

use crate::engine::{CancelHandle, TaskId};
use crate::types::{RunOutcome, RunStatus, StreamKind};

/// One line of merged run output, tagged with its source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub stream: StreamKind,
}

/// State aggregate tracking one run.
///
/// Created when the run is requested (before the process has started),
/// mutated by streamed events and user actions, and destroyed only via an
/// explicit close once terminal. Illegal operations (cancelling a finished
/// run, finishing twice) are silently ignored rather than errors.
#[derive(Debug)]
pub struct RunRecord {
    id: TaskId,
    title: String,
    model: Option<String>,
    status: RunStatus,
    lines: Vec<OutputLine>,
    started_at: Instant,
    finished_at: Option<Instant>,
    /// Scroll offset in lines back from the newest line; 0 is pinned to the
    /// bottom. Every append snaps this back to 0.
    scroll_back: usize,
    cancel: Option<CancelHandle>,
    cancel_reason: Option<String>,
}

impl RunRecord {
    pub fn new(id: TaskId, title: String, model: Option<String>) -> Self {
        Self {
            id,
            title,
            model,
            status: RunStatus::Running,
            lines: Vec::new(),
            started_at: Instant::now(),
            finished_at: None,
            scroll_back: 0,
            cancel: None,
            cancel_reason: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn has_cancel_handle(&self) -> bool {
        self.cancel.is_some()
    }

    /// Time since the run was requested, frozen at the first terminal
    /// transition.
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Instant::now);
        end.duration_since(self.started_at)
    }

    /// Append one output line. Always permitted irrespective of status; the
    /// scroll position snaps to the newest line on every append.
    pub fn append_line(&mut self, text: String, stream: StreamKind) {
        self.lines.push(OutputLine { text, stream });
        self.scroll_back = 0;
    }

    /// Attach the cancellation handle delivered by the runner's ready event.
    ///
    /// Dropped silently if the record already reached a terminal state
    /// (cancelled before the process came up); the runner observes the
    /// dropped handle as a cancellation signal.
    pub fn attach_cancel(&mut self, handle: CancelHandle) {
        if self.is_running() {
            self.cancel = Some(handle);
        }
    }

    /// Cancel the run: invoke the cancellation handle, append one synthetic
    /// notice line and transition to Cancelled. Only meaningful while
    /// Running; a second call is a no-op.
    pub fn cancel(&mut self, reason: &str) {
        if !self.is_running() {
            return;
        }
        if let Some(mut handle) = self.cancel.take() {
            handle.request();
        }
        self.append_line(format!(">>> run cancelled ({reason})"), StreamKind::Err);
        self.cancel_reason = Some(reason.to_string());
        self.transition(RunStatus::Cancelled);
    }

    /// Apply the runner's terminal outcome. First terminal transition wins;
    /// later calls are no-ops (e.g. the runner's Cancelled event arriving
    /// after a user-initiated cancel already transitioned the record).
    pub fn finish(&mut self, outcome: RunOutcome) {
        if !self.is_running() {
            return;
        }
        self.transition(outcome.into());
    }

    fn transition(&mut self, status: RunStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.finished_at = Some(Instant::now());
        // Invariant: a cancellation handle exists iff the record is Running.
        self.cancel = None;
    }

    pub fn scroll_line_up(&mut self) {
        self.scroll_by(1);
    }

    pub fn scroll_line_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(1);
    }

    pub fn scroll_page_up(&mut self, page_lines: usize) {
        self.scroll_by(page_lines);
    }

    pub fn scroll_page_down(&mut self, page_lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(page_lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_back = self.max_scroll_back();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }

    /// Restore a scroll offset (minimize snapshot replay). Clamped.
    pub fn set_scroll_back(&mut self, offset: usize) {
        self.scroll_back = offset.min(self.max_scroll_back());
    }

    fn scroll_by(&mut self, lines: usize) {
        self.scroll_back = self
            .scroll_back
            .saturating_add(lines)
            .min(self.max_scroll_back());
    }

    fn max_scroll_back(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }
}
