// src/exec/agent_runner.rs

//! Individual agent process runner.

use std::env;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AgentSection;
use crate::engine::{CancelHandle, RunEvent, RunRequest, TaskId};
use crate::exec::run_log::{spawn_log_writer, LogEntry, RunLog};
use crate::types::{RunOutcome, StreamKind};

/// Run a single agent process for one task, delivering ready/output/terminal
/// events on the task's delivery queue.
///
/// Every failure resolves to a terminal `Finished` event on the queue; this
/// function never propagates an error to its caller.
///
/// - The ready event (carrying the cancellation handle) is sent strictly
///   before any output line.
/// - If the cancel channel fires, the stream readers are stopped first so
///   no further output is delivered, then the child process is killed and
///   the run is classified as Cancelled.
pub async fn run_agent(req: RunRequest, agent: AgentSection, events_tx: mpsc::Sender<RunEvent>) {
    let task = req.id.clone();

    // Preflight: the external tool must be resolvable before anything is
    // spawned. No process, no log artifact, no cancellation handle.
    if !tool_resolvable(&agent.command) {
        info!(task = %task, command = %agent.command, "agent tool not resolvable");
        let _ = events_tx
            .send(RunEvent::Finished {
                task,
                outcome: RunOutcome::Failed,
                detail: Some(format!(
                    "agent tool '{}' not found on PATH",
                    agent.command
                )),
            })
            .await;
        return;
    }

    if let Err(err) = run_agent_inner(&req, &agent, &events_tx).await {
        tracing::error!(
            task = %task,
            error = %err,
            "agent execution error"
        );
        let _ = events_tx
            .send(RunEvent::Finished {
                task,
                outcome: RunOutcome::Failed,
                detail: Some(format!("{err:#}")),
            })
            .await;
    }
}

async fn run_agent_inner(
    req: &RunRequest,
    agent: &AgentSection,
    events_tx: &mpsc::Sender<RunEvent>,
) -> Result<()> {
    info!(
        task = %req.id,
        command = %agent.command,
        model = ?req.model,
        "starting agent process"
    );

    let mut cmd = Command::new(&agent.command);
    cmd.args(&agent.args);
    if let Some(model) = &req.model {
        cmd.arg(&agent.model_flag).arg(model);
    }
    cmd.arg(&req.prompt);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning agent process for task '{}'", req.id))?;

    let stdout = child
        .stdout
        .take()
        .context("agent process stdout pipe missing")?;
    let stderr = child
        .stderr
        .take()
        .context("agent process stderr pipe missing")?;

    // The process is up: hand out the cancellation handle before any stream
    // reader exists, so the ready event always precedes output lines.
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    events_tx
        .send(RunEvent::Ready {
            task: req.id.clone(),
            cancel: CancelHandle::new(cancel_tx),
        })
        .await
        .context("delivering ready event")?;

    // Best-effort log artifact; creation failure degrades to a warning line.
    let log_tx = match RunLog::create(&agent.log_dir, &req.id) {
        Ok(log) => {
            let (tx, _writer) = spawn_log_writer(log, req.id.clone(), events_tx.clone());
            Some(tx)
        }
        Err(err) => {
            warn!(
                task = %req.id,
                log_dir = %agent.log_dir.display(),
                error = %err,
                "could not create run log"
            );
            let _ = events_tx
                .send(RunEvent::OutputLine {
                    task: req.id.clone(),
                    line: format!(
                        "warning: could not create run log in {}: {}",
                        agent.log_dir.display(),
                        err
                    ),
                    stream: StreamKind::Err,
                })
                .await;
            None
        }
    };

    let out_reader = spawn_stream_reader(
        stdout,
        StreamKind::Out,
        req.id.clone(),
        events_tx.clone(),
        log_tx.clone(),
    );
    let err_reader = spawn_stream_reader(
        stderr,
        StreamKind::Err,
        req.id.clone(),
        events_tx.clone(),
        log_tx.clone(),
    );

    // Either the process exits on its own (normal case), or we receive a
    // cancellation request.
    let (outcome, detail) = tokio::select! {
        status_res = child.wait() => {
            let status = status_res.with_context(|| {
                format!("waiting for agent process of task '{}'", req.id)
            })?;

            // Let the readers drain buffered output before the terminal
            // event, so the queue sees every line first.
            let _ = out_reader.await;
            let _ = err_reader.await;

            let code = status.code().unwrap_or(-1);
            info!(
                task = %req.id,
                exit_code = code,
                success = status.success(),
                "agent process exited"
            );

            if status.success() {
                (RunOutcome::Completed, None)
            } else {
                (RunOutcome::Failed, Some(format!("agent exited with status {code}")))
            }
        }

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(task = %req.id, "cancellation requested; killing agent process");
                }
                Err(_) => {
                    // Handle dropped without an explicit signal: the record
                    // was cancelled before the ready event was applied.
                    debug!(task = %req.id, "cancel handle dropped; treating as cancellation");
                }
            }

            // Stop forwarding output first, then terminate the process. A
            // process that ignores the kill may keep running, but nothing it
            // prints is delivered anymore.
            out_reader.abort();
            err_reader.abort();
            if let Err(e) = child.kill().await {
                warn!(
                    task = %req.id,
                    error = %e,
                    "failed to kill agent process on cancellation"
                );
            }

            (RunOutcome::Cancelled, None)
        }
    };

    if let Some(log_tx) = log_tx {
        let _ = log_tx.send(LogEntry::Trailer(outcome)).await;
    }

    events_tx
        .send(RunEvent::Finished {
            task: req.id.clone(),
            outcome,
            detail,
        })
        .await
        .with_context(|| format!("delivering terminal event for task '{}'", req.id))?;

    Ok(())
}

/// Spawn a reader pushing one stream's lines onto the delivery queue.
///
/// The bounded send blocks when the queue is full: slow consumers apply
/// backpressure to the process rather than losing lines. Within a single
/// stream, delivery order is exactly read order.
fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: StreamKind,
    task: TaskId,
    events_tx: mpsc::Sender<RunEvent>,
    log_tx: Option<mpsc::Sender<LogEntry>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reader = BufReader::new(stream);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(log_tx) = &log_tx {
                // Ignore a dead writer; the log already degraded to a
                // warning line.
                let _ = log_tx.send(LogEntry::Line(kind, line.clone())).await;
            }

            let event = RunEvent::OutputLine {
                task: task.clone(),
                line,
                stream: kind,
            };
            if events_tx.send(event).await.is_err() {
                // Consumer gone; stop reading.
                break;
            }
        }
    })
}

/// Check whether the agent tool can be invoked: an explicit path must point
/// at a file, a bare name must resolve over `PATH`.
fn tool_resolvable(command: &str) -> bool {
    let path = Path::new(command);
    if path.components().count() > 1 {
        return path.is_file();
    }

    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| {
        let full = dir.join(command);
        full.is_file() || full.is_symlink()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_shell_on_path() {
        assert!(tool_resolvable("sh"));
    }

    #[test]
    fn rejects_nonexistent_tool() {
        assert!(!tool_resolvable("definitely-not-a-real-tool-9f3a"));
    }

    #[test]
    fn explicit_path_must_exist() {
        assert!(tool_resolvable("/bin/sh"));
        assert!(!tool_resolvable("/nonexistent/dir/tool"));
    }
}
