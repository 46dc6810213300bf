//! Agent runner integration tests against real processes (`sh`/`echo`), the
//! missing-tool preflight and the per-run log artifact.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;

use taskmux::config::AgentSection;
use taskmux::engine::{CancelHandle, RunEvent, RunRequest};
use taskmux::exec::run_agent;
use taskmux::types::{RunOutcome, StreamKind};
use taskmux_test_utils::{init_tracing, with_timeout};

fn shell_agent(log_dir: &Path) -> AgentSection {
    AgentSection {
        command: "sh".to_string(),
        args: vec!["-c".to_string()],
        model_flag: "--model".to_string(),
        log_dir: log_dir.to_path_buf(),
    }
}

fn request(id: &str, script: &str) -> RunRequest {
    RunRequest {
        id: id.to_string(),
        title: format!("task {id}"),
        prompt: script.to_string(),
        model: None,
    }
}

/// Drive a run to completion and collect every delivered event.
async fn collect_events(req: RunRequest, agent: AgentSection) -> Vec<RunEvent> {
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(run_agent(req, agent, tx));

    with_timeout(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let terminal = matches!(event, RunEvent::Finished { .. });
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    })
    .await
}

fn output_lines(events: &[RunEvent], kind: StreamKind) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::OutputLine { line, stream, .. } if *stream == kind => {
                Some(line.as_str())
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn ready_precedes_output_and_streams_are_tagged() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let events = collect_events(
        request("T1", "printf 'a\\nb\\n'; echo diag >&2"),
        shell_agent(dir.path()),
    )
    .await;

    assert!(
        matches!(events.first(), Some(RunEvent::Ready { .. })),
        "first event must be ready, got {:?}",
        events.first()
    );

    // Within the primary stream, order is exactly write order.
    assert_eq!(output_lines(&events, StreamKind::Out), vec!["a", "b"]);
    assert_eq!(output_lines(&events, StreamKind::Err), vec!["diag"]);

    match events.last() {
        Some(RunEvent::Finished { outcome, .. }) => {
            assert_eq!(*outcome, RunOutcome::Completed)
        }
        other => panic!("expected terminal event, got {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_exit_classifies_as_failed_with_detail() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let events = collect_events(request("T1", "exit 3"), shell_agent(dir.path())).await;

    match events.last() {
        Some(RunEvent::Finished {
            outcome,
            detail: Some(detail),
            ..
        }) => {
            assert_eq!(*outcome, RunOutcome::Failed);
            assert!(detail.contains("3"), "detail should carry the exit code");
        }
        other => panic!("expected failed terminal event, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_tool_fails_preflight_without_spawning_anything() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let mut agent = shell_agent(dir.path());
    agent.command = "definitely-not-a-real-agent-tool".to_string();

    let events = collect_events(request("T1", "echo hi"), agent).await;

    // A single terminal event: no ready, no cancellation handle, no output.
    assert_eq!(events.len(), 1);
    match &events[0] {
        RunEvent::Finished {
            outcome,
            detail: Some(detail),
            ..
        } => {
            assert_eq!(*outcome, RunOutcome::Failed);
            assert!(detail.contains("not found"));
        }
        other => panic!("expected failed terminal event, got {other:?}"),
    }

    // And no log artifact was created.
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn log_artifact_records_tagged_lines_and_trailer() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    collect_events(
        request("T1", "echo out1; echo err1 >&2"),
        shell_agent(dir.path()),
    )
    .await;

    let log_path = dir.path().join("T1.log");
    // The background writer may still be flushing after the terminal event.
    let contents = with_timeout(async {
        loop {
            if let Ok(contents) = std::fs::read_to_string(&log_path) {
                if contents.contains("--- finished") {
                    break contents;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(contents.contains("[OUT] out1"));
    assert!(contents.contains("[ERR] err1"));
    assert!(contents.contains("--- finished completed at "));
}

#[tokio::test]
async fn cancellation_kills_the_process_and_classifies_cancelled() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(run_agent(
        request("T1", "echo started; sleep 30"),
        shell_agent(dir.path()),
        tx,
    ));

    let outcome = with_timeout(async move {
        let mut handle: Option<CancelHandle> = None;
        loop {
            match rx.recv().await.expect("runner closed queue early") {
                RunEvent::Ready { cancel, .. } => handle = Some(cancel),
                RunEvent::OutputLine { line, .. } if line == "started" => {
                    // Process is demonstrably alive; request termination.
                    handle
                        .as_mut()
                        .expect("ready precedes output")
                        .request();
                }
                RunEvent::Finished { outcome, .. } => break outcome,
                RunEvent::OutputLine { .. } => {}
            }
        }
    })
    .await;

    assert_eq!(outcome, RunOutcome::Cancelled);
}

#[tokio::test]
async fn model_flag_is_passed_before_the_prompt() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    // `echo` prints its arguments back: flag, model, then prompt.
    let agent = AgentSection {
        command: "echo".to_string(),
        args: vec![],
        model_flag: "--model".to_string(),
        log_dir: dir.path().to_path_buf(),
    };
    let req = RunRequest {
        id: "T1".to_string(),
        title: "task".to_string(),
        prompt: "do the thing".to_string(),
        model: Some("sonnet".to_string()),
    };

    let events = collect_events(req, agent).await;
    assert_eq!(
        output_lines(&events, StreamKind::Out),
        vec!["--model sonnet do the thing"]
    );
}
