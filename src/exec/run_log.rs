// src/exec/run_log.rs

//! Per-run log artifact.
//!
//! Each run gets one append-only, human-readable log file in the configured
//! log directory. Lines carry the `[OUT]`/`[ERR]` stream tag; a trailer
//! records the final status and completion time. Everything here is
//! best-effort: the first failure disables the writer for the rest of the
//! run and surfaces a single warning line through the normal delivery
//! queue, never a run failure.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::{RunEvent, TaskId};
use crate::types::{RunOutcome, StreamKind};

/// One entry for the run's background log writer.
#[derive(Debug)]
pub enum LogEntry {
    Line(StreamKind, String),
    Trailer(RunOutcome),
}

/// Append-only log file for one run.
#[derive(Debug)]
pub struct RunLog {
    file: File,
    path: PathBuf,
}

impl RunLog {
    /// Create `<log_dir>/<task_id>.log`, creating the directory if needed.
    pub fn create(log_dir: &Path, task: &str) -> std::io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{task}.log"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_entry(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        match entry {
            LogEntry::Line(stream, text) => {
                writeln!(self.file, "{} {}", stream.tag(), text)
            }
            LogEntry::Trailer(outcome) => {
                writeln!(
                    self.file,
                    "--- finished {} at {} ---",
                    outcome,
                    Utc::now().to_rfc3339()
                )
            }
        }
    }
}

/// Spawn the background writer owning this run's log artifact.
///
/// Readers and the runner feed it over the returned sender; `events_tx` is
/// only used to deliver the single degradation warning. The writer exits
/// when every sender is dropped or on the first write error.
pub fn spawn_log_writer(
    mut log: RunLog,
    task: TaskId,
    events_tx: mpsc::Sender<RunEvent>,
) -> (mpsc::Sender<LogEntry>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<LogEntry>(64);

    let handle = tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            if let Err(err) = log.write_entry(&entry) {
                warn!(
                    task = %task,
                    path = %log.path().display(),
                    error = %err,
                    "run log write failed; disabling log for this run"
                );
                let _ = events_tx
                    .send(RunEvent::OutputLine {
                        task: task.clone(),
                        line: format!(
                            "warning: run log {} unavailable: {}",
                            log.path().display(),
                            err
                        ),
                        stream: StreamKind::Err,
                    })
                    .await;
                return;
            }
        }
        debug!(task = %task, "run log writer finished");
    });

    (tx, handle)
}
