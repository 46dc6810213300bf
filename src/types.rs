// src/types.rs

use std::fmt;

/// Lifecycle status of a run record.
///
/// `Running` is the only non-terminal state. Transitions go
/// `Running -> {Completed, Failed, Cancelled}` and terminal states are
/// final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of an agent process, as reported by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Clean exit (status code 0).
    Completed,
    /// Non-zero exit, or a spawn/pipe error before the process could run.
    Failed,
    /// Cancellation was requested before the process exited.
    Cancelled,
}

impl From<RunOutcome> for RunStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunStatus::Completed,
            RunOutcome::Failed => RunStatus::Failed,
            RunOutcome::Cancelled => RunStatus::Cancelled,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        RunStatus::from(*self).fmt(f)
    }
}

/// Which of the two merged process streams a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Primary stream (the process's stdout).
    Out,
    /// Diagnostic stream (the process's stderr).
    Err,
}

impl StreamKind {
    /// Tag used in the per-run log artifact.
    pub fn tag(self) -> &'static str {
        match self {
            StreamKind::Out => "[OUT]",
            StreamKind::Err => "[ERR]",
        }
    }
}
