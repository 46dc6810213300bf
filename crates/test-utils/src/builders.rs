#![allow(dead_code)]

use taskmux::config::{ConfigFile, RawConfigFile};
use taskmux::engine::{Action, RunRequest};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.config.agent.command = command.to_string();
        self
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.config.agent.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.agent.log_dir = dir.into();
        self
    }

    pub fn with_cancel_confirm_after_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.cancel_confirm_after_secs = secs;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.orchestrator.queue_capacity = capacity;
        self
    }

    pub fn with_tab_window(mut self, window: usize) -> Self {
        self.config.orchestrator.tab_window = window;
        self
    }

    pub fn with_page_lines(mut self, lines: usize) -> Self {
        self.config.orchestrator.page_lines = lines;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a launch action with a trivial prompt and no model.
pub fn launch(id: &str, title: &str) -> Action {
    Action::Launch(RunRequest {
        id: id.to_string(),
        title: title.to_string(),
        prompt: format!("work on {title}"),
        model: None,
    })
}
