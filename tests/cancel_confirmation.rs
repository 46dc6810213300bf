//! Tiered cancellation-confirmation gate, driven on a paused Tokio clock so
//! elapsed time is exact.

use std::time::Duration;

use taskmux::engine::{Action, CancelHandle, RunEvent, RunRequest, Supervisor, SupervisorOptions};
use taskmux::types::{RunOutcome, RunStatus};
use tokio::sync::oneshot;

const THRESHOLD: Duration = Duration::from_secs(5);

fn supervisor() -> Supervisor {
    Supervisor::new(SupervisorOptions {
        cancel_confirm_after: THRESHOLD,
        ..SupervisorOptions::default()
    })
}

/// Launch a run and deliver its ready event; returns the cancel receiver so
/// tests can observe whether termination was requested.
fn launch_ready(sup: &mut Supervisor, id: &str) -> oneshot::Receiver<()> {
    sup.apply_action(Action::Launch(RunRequest {
        id: id.to_string(),
        title: format!("task {id}"),
        prompt: format!("work on {id}"),
        model: None,
    }));
    let (tx, rx) = oneshot::channel();
    sup.apply_event(RunEvent::Ready {
        task: id.to_string(),
        cancel: CancelHandle::new(tx),
    });
    rx
}

fn notice_lines(sup: &Supervisor, index: usize) -> usize {
    sup.records()[index]
        .lines()
        .iter()
        .filter(|l| l.text.contains("cancelled"))
        .count()
}

#[tokio::test(start_paused = true)]
async fn quick_runs_cancel_without_confirmation() {
    let mut sup = supervisor();
    let mut cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(Duration::from_secs(2)).await;
    sup.apply_action(Action::RequestCancelActive);

    assert_eq!(sup.records()[0].status(), RunStatus::Cancelled);
    assert_eq!(sup.pending_cancel(), None);
    assert_eq!(notice_lines(&sup, 0), 1);
    assert!(cancel_rx.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn long_runs_require_explicit_confirmation() {
    let mut sup = supervisor();
    let mut cancel_rx = launch_ready(&mut sup, "T1");

    // 6 seconds elapsed with a 5 second threshold.
    tokio::time::advance(Duration::from_secs(6)).await;
    sup.apply_action(Action::RequestCancelActive);

    // Gate open: no cancellation yet.
    assert_eq!(sup.pending_cancel(), Some(0));
    assert_eq!(sup.records()[0].status(), RunStatus::Running);
    assert_eq!(notice_lines(&sup, 0), 0);
    assert!(cancel_rx.try_recv().is_err());

    sup.apply_action(Action::ConfirmCancel);
    assert_eq!(sup.pending_cancel(), None);
    assert_eq!(sup.records()[0].status(), RunStatus::Cancelled);
    assert_eq!(notice_lines(&sup, 0), 1);
    assert!(cancel_rx.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn elapsed_exactly_at_threshold_requires_confirmation() {
    let mut sup = supervisor();
    let _cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(THRESHOLD).await;
    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.pending_cancel(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn dismiss_leaves_run_running_with_no_pending_confirmation() {
    let mut sup = supervisor();
    let mut cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(Duration::from_secs(10)).await;
    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.pending_cancel(), Some(0));

    sup.apply_action(Action::DismissCancel);
    assert_eq!(sup.pending_cancel(), None);
    assert_eq!(sup.records()[0].status(), RunStatus::Running);
    assert_eq!(notice_lines(&sup, 0), 0);
    assert!(cancel_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn routing_is_suspended_while_gate_is_open() {
    let mut sup = supervisor();
    let _a = launch_ready(&mut sup, "A");
    let _b = launch_ready(&mut sup, "B");

    tokio::time::advance(Duration::from_secs(10)).await;
    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.pending_cancel(), Some(1));

    // Navigation and exit are ignored until the confirmation resolves.
    sup.apply_action(Action::SelectPrevious);
    assert_eq!(sup.active_index(), Some(1));
    let step = sup.apply_action(Action::RequestExit);
    assert!(step.keep_running);

    // Events still flow to records while the gate is open.
    sup.apply_event(RunEvent::OutputLine {
        task: "A".to_string(),
        line: "still streaming".to_string(),
        stream: taskmux::types::StreamKind::Out,
    });
    assert_eq!(sup.records()[0].lines().len(), 1);

    sup.apply_action(Action::DismissCancel);
    sup.apply_action(Action::SelectPrevious);
    assert_eq!(sup.active_index(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn gate_closes_itself_when_pending_run_finishes() {
    let mut sup = supervisor();
    let _cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(Duration::from_secs(10)).await;
    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.pending_cancel(), Some(0));

    sup.apply_event(RunEvent::Finished {
        task: "T1".to_string(),
        outcome: RunOutcome::Completed,
        detail: None,
    });
    assert_eq!(sup.pending_cancel(), None);
    assert_eq!(sup.records()[0].status(), RunStatus::Completed);

    // A late confirm has nothing to cancel.
    sup.apply_action(Action::ConfirmCancel);
    assert_eq!(sup.records()[0].status(), RunStatus::Completed);
    assert_eq!(notice_lines(&sup, 0), 0);
}

#[tokio::test(start_paused = true)]
async fn second_cancel_request_is_a_noop() {
    let mut sup = supervisor();
    let _cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(Duration::from_secs(1)).await;
    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.records()[0].status(), RunStatus::Cancelled);

    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.pending_cancel(), None);
    assert_eq!(notice_lines(&sup, 0), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_request_on_terminal_record_is_ignored() {
    let mut sup = supervisor();
    let _cancel_rx = launch_ready(&mut sup, "T1");
    sup.apply_event(RunEvent::Finished {
        task: "T1".to_string(),
        outcome: RunOutcome::Failed,
        detail: None,
    });

    tokio::time::advance(Duration::from_secs(10)).await;
    sup.apply_action(Action::RequestCancelActive);
    assert_eq!(sup.pending_cancel(), None);
    assert_eq!(sup.records()[0].status(), RunStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn elapsed_never_increases_after_terminal_transition() {
    let mut sup = supervisor();
    let _cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(Duration::from_secs(3)).await;
    sup.apply_action(Action::RequestCancelActive);
    let frozen = sup.records()[0].elapsed();
    assert_eq!(frozen, Duration::from_secs(3));

    tokio::time::advance(Duration::from_secs(120)).await;
    assert_eq!(sup.records()[0].elapsed(), frozen);
}

#[tokio::test(start_paused = true)]
async fn pending_confirmation_is_exposed_in_the_view() {
    let mut sup = supervisor();
    let _cancel_rx = launch_ready(&mut sup, "T1");

    tokio::time::advance(Duration::from_secs(8)).await;
    sup.apply_action(Action::RequestCancelActive);

    let view = sup.view();
    let pending = view.pending_cancel.expect("pending confirmation in view");
    assert_eq!(pending.id, "T1");
    assert_eq!(pending.index, 0);
    assert_eq!(pending.elapsed, Duration::from_secs(8));
}
