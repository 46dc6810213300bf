// src/engine/runtime.rs

use std::fmt;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::engine::view::TabsView;
use crate::engine::{Action, Command, RunEvent, Supervisor};
use crate::errors::Result;
use crate::exec::AgentBackend;

/// Drives the supervisor in response to host actions and runner events,
/// and delegates actual process launching to an [`AgentBackend`].
///
/// This is a pure IO shell around [`Supervisor`], which contains all the
/// multiplexing semantics. The loop here is the single consuming flow of
/// the session: every record mutation happens on it, even though stream
/// readers produce events concurrently. After each applied input a fresh
/// [`TabsView`] snapshot is published for the host renderer.
pub struct Runtime<B: AgentBackend> {
    core: Supervisor,
    action_rx: mpsc::Receiver<Action>,
    event_rx: mpsc::Receiver<RunEvent>,
    backend: B,
    view_tx: watch::Sender<TabsView>,
}

impl<B: AgentBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: AgentBackend> Runtime<B> {
    pub fn new(
        core: Supervisor,
        action_rx: mpsc::Receiver<Action>,
        event_rx: mpsc::Receiver<RunEvent>,
        backend: B,
        view_tx: watch::Sender<TabsView>,
    ) -> Self {
        Self {
            core,
            action_rx,
            event_rx,
            backend,
            view_tx,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes host `Action`s and runner `RunEvent`s.
    /// - Feeds them into the supervisor core.
    /// - Executes commands returned by the core (launch runs).
    /// - Publishes a view snapshot after every applied input.
    ///
    /// Resolves when the host requests exit and no record is Running, or
    /// when the action channel closes.
    pub async fn run(mut self) -> Result<()> {
        info!("taskmux runtime started");
        self.publish();

        // Stops polling the event channel once every runner sender is gone,
        // while the action loop keeps serving the host.
        let mut events_open = true;

        loop {
            tokio::select! {
                action = self.action_rx.recv() => {
                    let Some(action) = action else {
                        info!("action channel closed; exiting");
                        break;
                    };
                    debug!(?action, "runtime received action");

                    let step = self.core.apply_action(action);
                    for command in step.commands {
                        self.execute_command(command).await?;
                    }
                    self.publish();

                    if !step.keep_running {
                        info!("core requested exit; stopping runtime");
                        break;
                    }
                }
                event = self.event_rx.recv(), if events_open => {
                    match event {
                        Some(event) => {
                            self.core.apply_event(event);
                            self.publish();
                        }
                        None => {
                            debug!("run event channel closed");
                            events_open = false;
                        }
                    }
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Launch(req) => {
                debug!(task = %req.id, "dispatching run to agent backend");
                self.backend.launch(req).await?;
            }
        }
        Ok(())
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.core.view());
    }
}
