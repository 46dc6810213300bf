// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Process-level failures never surface here: the runner resolves them to a
//! terminal status on the owning record. This enum only covers the fallible
//! library surface (configuration loading, session wiring).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskmuxError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaskmuxError>;
