// src/config/model.rs

//! Configuration data model.
//!
//! `RawConfigFile` is what serde deserializes from `Taskmux.toml`; all
//! fields carry defaults so an empty file is a usable starting point (apart
//! from validation, see `validate.rs`). `ConfigFile` is the validated form
//! handed to the rest of the crate.

use std::path::PathBuf;

use serde::Deserialize;

/// How the external agent tool is invoked.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// Executable name (resolved over `PATH`) or an explicit path.
    #[serde(default = "default_command")]
    pub command: String,

    /// Base arguments placed before the rendered prompt.
    #[serde(default)]
    pub args: Vec<String>,

    /// Flag used to pass a model selector, e.g. `--model`.
    #[serde(default = "default_model_flag")]
    pub model_flag: String,

    /// Directory for per-run log artifacts.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            model_flag: default_model_flag(),
            log_dir: default_log_dir(),
        }
    }
}

/// Tuning knobs for the run multiplexer.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSection {
    /// Runs older than this (seconds) require an explicit confirmation
    /// before they are cancelled. Zero means every cancel is confirmed.
    #[serde(default = "default_cancel_confirm_after_secs")]
    pub cancel_confirm_after_secs: u64,

    /// Capacity of each run's bounded output delivery queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of tabs kept visible in the tab strip window.
    #[serde(default = "default_tab_window")]
    pub tab_window: usize,

    /// Lines moved by one page-scroll request.
    #[serde(default = "default_page_lines")]
    pub page_lines: usize,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            cancel_confirm_after_secs: default_cancel_confirm_after_secs(),
            queue_capacity: default_queue_capacity(),
            tab_window: default_tab_window(),
            page_lines: default_page_lines(),
        }
    }
}

/// Raw, unvalidated configuration as deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)` (see `validate.rs`) so that
/// invariants like non-zero queue capacity hold everywhere downstream.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub agent: AgentSection,
    pub orchestrator: OrchestratorSection,
}

impl ConfigFile {
    /// Build a `ConfigFile` without running validation.
    ///
    /// Only `validate.rs` should call this.
    pub(crate) fn new_unchecked(agent: AgentSection, orchestrator: OrchestratorSection) -> Self {
        Self {
            agent,
            orchestrator,
        }
    }
}

fn default_command() -> String {
    "claude".to_string()
}

fn default_model_flag() -> String {
    "--model".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".taskmux/logs")
}

fn default_cancel_confirm_after_secs() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    256
}

fn default_tab_window() -> usize {
    6
}

fn default_page_lines() -> usize {
    20
}
