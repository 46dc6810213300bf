// src/engine/mod.rs

//! Run multiplexing engine for taskmux.
//!
//! This module ties together:
//! - per-run records (buffered output, status state machine, scroll state)
//! - the supervisor that multiplexes records into a navigable tab view and
//!   gates cancellation of long-running work behind a confirmation
//! - the main runtime event loop that reacts to:
//!   - host UI actions (navigate, scroll, minimize, cancel, close, exit)
//!   - runner events (ready, output lines, terminal outcomes)
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::ConfigFile;
use crate::types::{RunOutcome, StreamKind};

/// Canonical task id type used throughout the engine.
pub type TaskId = String;

/// Everything needed to launch one agent run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub id: TaskId,
    pub title: String,
    /// Fully rendered prompt handed to the agent tool.
    pub prompt: String,
    /// Optional model selector, passed via the configured model flag.
    pub model: Option<String>,
}

/// Opaque capability to request termination of a running agent process.
///
/// The signal can be sent at most once; requesting again is a no-op. The
/// handle lives on the owning record exactly while that record is Running.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    pub fn new(tx: oneshot::Sender<()>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Request termination. Returns whether a signal was actually sent
    /// (false if already requested, or the runner is gone).
    pub fn request(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Events flowing into the runtime from agent runners, keyed by task id.
#[derive(Debug)]
pub enum RunEvent {
    /// The process has started; always precedes any `OutputLine` for the
    /// task, so a Running record is cancellable as soon as possible.
    Ready { task: TaskId, cancel: CancelHandle },
    /// One merged-stream output line.
    OutputLine {
        task: TaskId,
        line: String,
        stream: StreamKind,
    },
    /// The run reached a terminal state. Sent exactly once per run.
    Finished {
        task: TaskId,
        outcome: RunOutcome,
        detail: Option<String>,
    },
}

/// Discrete requests arriving from the host UI's input loop.
#[derive(Debug, Clone)]
pub enum Action {
    /// Delegate a work item to the agent: create + select a record and
    /// dispatch the run.
    Launch(RunRequest),
    SelectNext,
    SelectPrevious,
    SelectDirect(usize),
    ScrollLineUp,
    ScrollLineDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleMinimize,
    /// Cancel the active record, possibly via the confirmation gate.
    RequestCancelActive,
    /// Affirmative response to an open cancellation confirmation.
    ConfirmCancel,
    /// Negative/dismiss response to an open cancellation confirmation.
    DismissCancel,
    CloseRecord(usize),
    RequestExit,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum Command {
    /// Hand this run to the agent backend.
    Launch(RunRequest),
}

/// Decision returned by the core after handling a single [`Action`].
#[derive(Debug)]
pub struct Step {
    /// Commands the IO shell should execute.
    pub commands: Vec<Command>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl Step {
    pub fn none() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

/// Supervisor tuning derived from config.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Runs older than this require confirmation before cancelling.
    pub cancel_confirm_after: Duration,
    /// Tabs kept visible in the tab strip window.
    pub tab_window: usize,
    /// Lines moved per page-scroll request.
    pub page_lines: usize,
}

impl SupervisorOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            cancel_confirm_after: Duration::from_secs(cfg.orchestrator.cancel_confirm_after_secs),
            tab_window: cfg.orchestrator.tab_window,
            page_lines: cfg.orchestrator.page_lines,
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            cancel_confirm_after: Duration::from_secs(5),
            tab_window: 6,
            page_lines: 20,
        }
    }
}

pub mod core;
pub mod record;
pub mod runtime;
pub mod view;

pub use self::core::Supervisor;
pub use record::{OutputLine, RunRecord};
pub use runtime::Runtime;
pub use view::{ActiveContent, MinimizedSummary, PendingCancel, TabLabel, TabsView};
