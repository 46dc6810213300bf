// src/exec/mod.rs

//! Agent process execution layer.
//!
//! This module is responsible for actually running the external agent tool
//! for each task, using `tokio::process::Command`, and reporting back to
//! the multiplexing runtime via `RunEvent`s.
//!
//! - [`backend`] provides the `AgentBackend` trait and the concrete
//!   `AgentLauncher` that the runtime uses in production, and which tests
//!   can replace with a fake implementation.
//! - [`agent_runner`] handles one agent process: preflight, spawn, stream
//!   readers, cancellation and terminal classification.
//! - [`run_log`] owns the best-effort per-run log artifact.

pub mod agent_runner;
pub mod backend;
pub mod run_log;

pub use agent_runner::run_agent;
pub use backend::{AgentBackend, AgentLauncher};
pub use run_log::RunLog;
