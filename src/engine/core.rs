// src/engine/core.rs

//! Pure core supervisor state machine.
//!
//! This module contains a synchronous, deterministic "supervisor" that
//! consumes host [`Action`]s and runner [`RunEvent`]s and produces:
//! - updated record/selection/minimize state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible
//! for:
//! - reading actions and events from channels
//! - handing launches to the agent backend
//! - publishing view snapshots
//!
//! The supervisor has no fallible operations: illegal selection, illegal
//! transitions and exit-while-running are all defined as no-ops, so the
//! host never needs fault handling for orchestration calls. It is intended
//! to be extensively unit tested without any channels or processes.

use tracing::{debug, info};

use crate::engine::record::RunRecord;
use crate::engine::view::{ActiveContent, MinimizedSummary, PendingCancel, TabLabel, TabsView};
use crate::engine::{Action, Command, RunEvent, RunRequest, Step, SupervisorOptions};
use crate::types::StreamKind;

const USER_CANCEL_REASON: &str = "user request";

/// State replayed when a minimized view is restored.
#[derive(Debug, Clone)]
struct RestoreSnapshot {
    active: Option<usize>,
    scrolls: Vec<usize>,
}

/// Multiplexes all run records and routes actions/events.
///
/// Owns the ordered record collection, the active selection, the
/// minimize/restore snapshot, the tab-strip scroll window and the
/// cancellation-confirmation gate.
#[derive(Debug)]
pub struct Supervisor {
    records: Vec<RunRecord>,
    active: Option<usize>,
    minimized: bool,
    restore: Option<RestoreSnapshot>,
    tab_scroll: usize,
    pending_cancel: Option<usize>,
    options: SupervisorOptions,
}

impl Supervisor {
    pub fn new(options: SupervisorOptions) -> Self {
        Self {
            records: Vec::new(),
            active: None,
            minimized: false,
            restore: None,
            tab_scroll: 0,
            pending_cancel: None,
            options,
        }
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn pending_cancel(&self) -> Option<usize> {
        self.pending_cancel
    }

    /// Exit is refused while any record is Running.
    pub fn exit_permitted(&self) -> bool {
        !self.records.iter().any(RunRecord::is_running)
    }

    /// Handle a single host action, updating state and returning the
    /// resulting commands for the IO shell.
    pub fn apply_action(&mut self, action: Action) -> Step {
        // While the confirmation gate is open, only the confirmation's own
        // responses are routed; everything else is suspended.
        if let Some(pending) = self.pending_cancel {
            return self.apply_gated_action(pending, action);
        }

        match action {
            Action::Launch(req) => self.launch(req),
            Action::SelectNext => {
                self.select_offset(1);
                Step::none()
            }
            Action::SelectPrevious => {
                self.select_offset(-1);
                Step::none()
            }
            Action::SelectDirect(n) => {
                self.select_direct(n);
                Step::none()
            }
            Action::ScrollLineUp => self.with_active(|rec, _| rec.scroll_line_up()),
            Action::ScrollLineDown => self.with_active(|rec, _| rec.scroll_line_down()),
            Action::ScrollPageUp => self.with_active(|rec, opts| rec.scroll_page_up(opts.page_lines)),
            Action::ScrollPageDown => {
                self.with_active(|rec, opts| rec.scroll_page_down(opts.page_lines))
            }
            Action::ScrollToTop => self.with_active(|rec, _| rec.scroll_to_top()),
            Action::ScrollToBottom => self.with_active(|rec, _| rec.scroll_to_bottom()),
            Action::ToggleMinimize => {
                self.toggle_minimize();
                Step::none()
            }
            Action::RequestCancelActive => {
                self.request_cancel_active();
                Step::none()
            }
            // No gate open: confirmation responses have nothing to act on.
            Action::ConfirmCancel | Action::DismissCancel => Step::none(),
            Action::CloseRecord(index) => {
                self.close_record(index);
                Step::none()
            }
            Action::RequestExit => {
                if self.exit_permitted() {
                    info!("exit requested and permitted; stopping");
                    Step {
                        commands: Vec::new(),
                        keep_running: false,
                    }
                } else {
                    debug!("exit requested while runs are in flight; refused");
                    Step::none()
                }
            }
        }
    }

    /// Route a runner event to the matching record by task id.
    ///
    /// Unknown ids are ignored (the record was closed after its run ended,
    /// or the event raced record creation).
    pub fn apply_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::Ready { task, cancel } => {
                if let Some((_, rec)) = self.record_mut(&task) {
                    rec.attach_cancel(cancel);
                } else {
                    debug!(task = %task, "ready event for unknown task");
                }
            }
            RunEvent::OutputLine { task, line, stream } => {
                if let Some((_, rec)) = self.record_mut(&task) {
                    rec.append_line(line, stream);
                }
            }
            RunEvent::Finished {
                task,
                outcome,
                detail,
            } => {
                let Some((index, rec)) = self.record_mut(&task) else {
                    debug!(task = %task, "terminal event for unknown task");
                    return;
                };
                if let Some(detail) = detail {
                    rec.append_line(detail, StreamKind::Err);
                }
                rec.finish(outcome);
                info!(task = %task, outcome = %outcome, "run finished");

                // A confirmation pending on a record that just became
                // terminal has nothing left to cancel.
                if self.pending_cancel == Some(index) {
                    self.pending_cancel = None;
                }
            }
        }
    }

    /// Structured state needed to render the session.
    pub fn view(&self) -> TabsView {
        let tabs = self
            .records
            .iter()
            .map(|rec| TabLabel {
                id: rec.id().to_string(),
                title: rec.title().to_string(),
                status: rec.status(),
            })
            .collect();

        let content = if self.minimized {
            None
        } else {
            self.active.and_then(|i| self.records.get(i)).map(|rec| ActiveContent {
                id: rec.id().to_string(),
                title: rec.title().to_string(),
                model: rec.model().map(str::to_string),
                status: rec.status(),
                lines: rec.lines().to_vec(),
                scroll_back: rec.scroll_back(),
                elapsed: rec.elapsed(),
            })
        };

        let summary = if self.minimized {
            let statuses: Vec<_> = self.records.iter().map(RunRecord::status).collect();
            Some(MinimizedSummary::from_statuses(&statuses))
        } else {
            None
        };

        let pending_cancel = self
            .pending_cancel
            .and_then(|i| self.records.get(i).map(|rec| (i, rec)))
            .map(|(index, rec)| PendingCancel {
                index,
                id: rec.id().to_string(),
                title: rec.title().to_string(),
                elapsed: rec.elapsed(),
            });

        TabsView {
            tabs,
            active: self.active,
            tab_scroll: self.tab_scroll,
            minimized: self.minimized,
            content,
            summary,
            pending_cancel,
            exit_permitted: self.exit_permitted(),
        }
    }

    fn apply_gated_action(&mut self, pending: usize, action: Action) -> Step {
        match action {
            Action::ConfirmCancel => {
                self.pending_cancel = None;
                if let Some(rec) = self.records.get_mut(pending) {
                    rec.cancel(USER_CANCEL_REASON);
                }
            }
            Action::DismissCancel => {
                debug!("cancellation dismissed; run keeps going");
                self.pending_cancel = None;
            }
            other => {
                debug!(action = ?other, "action suspended while confirmation is open");
            }
        }
        Step::none()
    }

    fn launch(&mut self, req: RunRequest) -> Step {
        info!(task = %req.id, title = %req.title, "launching run");
        self.records.push(RunRecord::new(
            req.id.clone(),
            req.title.clone(),
            req.model.clone(),
        ));
        // Newest-first focus.
        self.active = Some(self.records.len() - 1);
        self.ensure_active_tab_visible();

        Step {
            commands: vec![Command::Launch(req)],
            keep_running: true,
        }
    }

    /// Cyclic selection; no-op with fewer than two records.
    fn select_offset(&mut self, delta: isize) {
        let n = self.records.len();
        if n < 2 {
            return;
        }
        let Some(active) = self.active else { return };
        let next = (active as isize + delta).rem_euclid(n as isize) as usize;
        self.active = Some(next);
        self.ensure_active_tab_visible();
    }

    /// Direct selection; out-of-range requests are silently ignored.
    fn select_direct(&mut self, n: usize) {
        if n < self.records.len() {
            self.active = Some(n);
            self.ensure_active_tab_visible();
        }
    }

    fn with_active(&mut self, f: impl FnOnce(&mut RunRecord, &SupervisorOptions)) -> Step {
        let options = self.options;
        if let Some(rec) = self.active.and_then(|i| self.records.get_mut(i)) {
            f(rec, &options);
        }
        Step::none()
    }

    /// Minimize snapshots the selection and every record's scroll offset;
    /// restore replays that snapshot exactly.
    fn toggle_minimize(&mut self) {
        if self.minimized {
            self.minimized = false;
            if let Some(snap) = self.restore.take() {
                self.active = snap
                    .active
                    .filter(|&i| i < self.records.len())
                    .or_else(|| self.default_active());
                for (rec, scroll) in self.records.iter_mut().zip(snap.scrolls) {
                    rec.set_scroll_back(scroll);
                }
                self.ensure_active_tab_visible();
            }
        } else {
            self.restore = Some(RestoreSnapshot {
                active: self.active,
                scrolls: self.records.iter().map(RunRecord::scroll_back).collect(),
            });
            self.minimized = true;
        }
    }

    fn request_cancel_active(&mut self) {
        let Some(index) = self.active else { return };
        let rec = &mut self.records[index];
        if !rec.is_running() {
            return;
        }

        if rec.elapsed() >= self.options.cancel_confirm_after {
            // Long-running work: require an explicit confirmation instead
            // of cancelling outright.
            debug!(task = %rec.id(), elapsed = ?rec.elapsed(), "opening cancel confirmation");
            self.pending_cancel = Some(index);
        } else {
            rec.cancel(USER_CANCEL_REASON);
        }
    }

    /// Close a terminal record; Running records are never destroyed.
    fn close_record(&mut self, index: usize) {
        let Some(rec) = self.records.get(index) else {
            return;
        };
        if !rec.status().is_terminal() {
            debug!(task = %rec.id(), "refusing to close a running record");
            return;
        }

        self.records.remove(index);

        self.active = if self.records.is_empty() {
            None
        } else {
            match self.active {
                Some(a) if a > index => Some(a - 1),
                Some(a) if a == index => Some(index.min(self.records.len() - 1)),
                other => other,
            }
        };

        if let Some(snap) = self.restore.as_mut() {
            if index < snap.scrolls.len() {
                snap.scrolls.remove(index);
            }
            snap.active = match snap.active {
                Some(a) if a > index => Some(a - 1),
                Some(a) if a == index => None,
                other => other,
            };
        }

        self.tab_scroll = self.tab_scroll.min(self.records.len().saturating_sub(1));
        self.ensure_active_tab_visible();
    }

    fn default_active(&self) -> Option<usize> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.len() - 1)
        }
    }

    /// Keep the active tab inside the tab-strip window.
    fn ensure_active_tab_visible(&mut self) {
        let Some(active) = self.active else {
            self.tab_scroll = 0;
            return;
        };
        let window = self.options.tab_window.max(1);
        if active < self.tab_scroll {
            self.tab_scroll = active;
        } else if active >= self.tab_scroll + window {
            self.tab_scroll = active + 1 - window;
        }
    }

    /// Find the record for a task id, newest first, so a reused id of a
    /// closed run never shadows the live one.
    fn record_mut(&mut self, id: &str) -> Option<(usize, &mut RunRecord)> {
        self.records
            .iter_mut()
            .enumerate()
            .rev()
            .find(|(_, rec)| rec.id() == id)
    }
}
