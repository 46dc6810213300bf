use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};

use taskmux::engine::{CancelHandle, RunEvent, RunRequest};
use taskmux::errors::Result;
use taskmux::exec::AgentBackend;
use taskmux::types::{RunOutcome, StreamKind};

/// A fake backend that:
/// - records which runs were launched
/// - immediately emits a ready event, the scripted output lines and a
///   terminal `Completed` event for each launch.
///
/// The oneshot cancel receivers are kept so tests can assert whether a
/// cancellation was actually requested.
pub struct FakeBackend {
    events_tx: mpsc::Sender<RunEvent>,
    launched: Arc<Mutex<Vec<RunRequest>>>,
    cancel_rxs: Arc<Mutex<Vec<(String, oneshot::Receiver<()>)>>>,
    script: Vec<String>,
}

impl FakeBackend {
    pub fn new(events_tx: mpsc::Sender<RunEvent>) -> Self {
        Self {
            events_tx,
            launched: Arc::new(Mutex::new(Vec::new())),
            cancel_rxs: Arc::new(Mutex::new(Vec::new())),
            script: Vec::new(),
        }
    }

    /// Output lines emitted for every launched run, in order.
    pub fn with_script(mut self, lines: &[&str]) -> Self {
        self.script = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn launched(&self) -> Arc<Mutex<Vec<RunRequest>>> {
        Arc::clone(&self.launched)
    }

    pub fn cancel_rxs(&self) -> Arc<Mutex<Vec<(String, oneshot::Receiver<()>)>>> {
        Arc::clone(&self.cancel_rxs)
    }
}

impl AgentBackend for FakeBackend {
    fn launch(
        &mut self,
        req: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.events_tx.clone();
        let launched = Arc::clone(&self.launched);
        let cancel_rxs = Arc::clone(&self.cancel_rxs);
        let script = self.script.clone();

        Box::pin(async move {
            let task = req.id.clone();
            {
                let mut guard = launched.lock().unwrap();
                guard.push(req);
            }

            let (cancel_tx, cancel_rx) = oneshot::channel();
            {
                let mut guard = cancel_rxs.lock().unwrap();
                guard.push((task.clone(), cancel_rx));
            }

            tx.send(RunEvent::Ready {
                task: task.clone(),
                cancel: CancelHandle::new(cancel_tx),
            })
            .await
            .map_err(anyhow::Error::from)?;

            for line in script {
                tx.send(RunEvent::OutputLine {
                    task: task.clone(),
                    line,
                    stream: StreamKind::Out,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }

            tx.send(RunEvent::Finished {
                task,
                outcome: RunOutcome::Completed,
                detail: None,
            })
            .await
            .map_err(anyhow::Error::from)?;

            Ok(())
        })
    }
}
