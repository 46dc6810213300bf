// src/lib.rs

pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use tokio::sync::{mpsc, watch};

use crate::config::ConfigFile;
use crate::engine::view::TabsView;
use crate::engine::{Action, RunEvent, Runtime, Supervisor, SupervisorOptions};
use crate::exec::AgentLauncher;

/// Capacity of the host action channel. Actions are tiny and consumed
/// immediately; this only smooths over input bursts.
const ACTION_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the merged runtime event channel the per-task forwarders
/// feed into.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Host-facing handles for one multiplexing session.
///
/// The host UI pushes discrete [`Action`]s through `actions` from its input
/// loop and renders whatever [`TabsView`] snapshot `views` currently holds.
#[derive(Debug, Clone)]
pub struct SessionHandles {
    pub actions: mpsc::Sender<Action>,
    pub views: watch::Receiver<TabsView>,
}

/// High-level entry point used by a host shell.
///
/// This wires together:
/// - the supervisor core (records, selection, cancellation gate)
/// - the production agent launcher
/// - the runtime event loop
///
/// The returned [`Runtime`] future must be driven (usually via
/// `tokio::spawn`) for the session to make progress; it resolves once the
/// host requests exit and no run is in flight.
pub fn session(cfg: &ConfigFile) -> (SessionHandles, Runtime<AgentLauncher>) {
    let (action_tx, action_rx) = mpsc::channel::<Action>(ACTION_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel::<RunEvent>(EVENT_CHANNEL_CAPACITY);

    let backend = AgentLauncher::new(cfg, event_tx);
    let core = Supervisor::new(SupervisorOptions::from_config(cfg));
    let (view_tx, view_rx) = watch::channel(core.view());

    let runtime = Runtime::new(core, action_rx, event_rx, backend, view_tx);

    (
        SessionHandles {
            actions: action_tx,
            views: view_rx,
        },
        runtime,
    )
}
