// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskmuxError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskmuxError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.agent, raw.orchestrator))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_agent(cfg)?;
    validate_orchestrator(cfg)?;
    Ok(())
}

fn validate_agent(cfg: &RawConfigFile) -> Result<()> {
    if cfg.agent.command.trim().is_empty() {
        return Err(TaskmuxError::ConfigError(
            "[agent].command must not be empty".to_string(),
        ));
    }

    if cfg.agent.model_flag.trim().is_empty() {
        return Err(TaskmuxError::ConfigError(
            "[agent].model_flag must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_orchestrator(cfg: &RawConfigFile) -> Result<()> {
    if cfg.orchestrator.queue_capacity == 0 {
        return Err(TaskmuxError::ConfigError(
            "[orchestrator].queue_capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.orchestrator.tab_window == 0 {
        return Err(TaskmuxError::ConfigError(
            "[orchestrator].tab_window must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.orchestrator.page_lines == 0 {
        return Err(TaskmuxError::ConfigError(
            "[orchestrator].page_lines must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::model::RawConfigFile;
    use crate::config::ConfigFile;

    #[test]
    fn default_raw_config_is_valid() {
        let raw = RawConfigFile::default();
        assert!(ConfigFile::try_from(raw).is_ok());
    }

    #[test]
    fn empty_command_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.agent.command = "  ".to_string();
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.orchestrator.queue_capacity = 0;
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn zero_tab_window_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.orchestrator.tab_window = 0;
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
