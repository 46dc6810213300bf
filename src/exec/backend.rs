// src/exec/backend.rs

//! Pluggable agent backend abstraction.
//!
//! The runtime talks to an `AgentBackend` instead of spawning processes
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production launcher implementation here.
//!
//! - `AgentLauncher` is the default implementation. For each launch it
//!   creates the run's bounded delivery queue, spawns the agent runner and
//!   a forwarder that drains the queue into the runtime's event channel.
//! - Tests can provide their own `AgentBackend` that, for example, records
//!   which runs were launched and directly emits scripted `RunEvent`s.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::debug;

use crate::config::{AgentSection, ConfigFile};
use crate::engine::{RunEvent, RunRequest};
use crate::errors::Result;

use super::agent_runner::run_agent;

/// Trait abstracting how requested runs are executed.
///
/// Production code uses [`AgentLauncher`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait AgentBackend: Send {
    /// Dispatch one run for execution.
    ///
    /// The implementation is free to:
    /// - spawn an OS process (production)
    /// - simulate the run and emit `RunEvent`s (tests)
    fn launch(&mut self, req: RunRequest)
        -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real agent backend used in production.
///
/// Each launch gets its own bounded delivery queue: the runner's two stream
/// readers push into it (blocking when full, so no line is ever dropped),
/// and a forwarder task drains it into the runtime's event channel in
/// order. The runtime loop stays the single consumer of every queue.
pub struct AgentLauncher {
    agent: AgentSection,
    queue_capacity: usize,
    events_tx: mpsc::Sender<RunEvent>,
}

impl AgentLauncher {
    /// Create a new launcher, wiring it to the given runtime event sender.
    pub fn new(cfg: &ConfigFile, events_tx: mpsc::Sender<RunEvent>) -> Self {
        Self {
            agent: cfg.agent.clone(),
            queue_capacity: cfg.orchestrator.queue_capacity,
            events_tx,
        }
    }
}

impl AgentBackend for AgentLauncher {
    fn launch(
        &mut self,
        req: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let (task_tx, mut task_rx) = mpsc::channel::<RunEvent>(self.queue_capacity);
        let events_tx = self.events_tx.clone();
        let agent = self.agent.clone();
        let task = req.id.clone();

        // Forwarder: per-task queue -> runtime event channel, in order.
        tokio::spawn(async move {
            while let Some(event) = task_rx.recv().await {
                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
            debug!(task = %task, "delivery queue drained");
        });

        tokio::spawn(run_agent(req, agent, task_tx));

        Box::pin(async { Ok(()) })
    }
}
