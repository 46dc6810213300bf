// src/config/mod.rs

//! Configuration for taskmux sessions.
//!
//! - [`model`] holds the serde-deserialized structs (`RawConfigFile`) and
//!   the validated [`ConfigFile`] used by the rest of the crate.
//! - [`loader`] reads the TOML file from disk.
//! - [`validate`] turns a `RawConfigFile` into a `ConfigFile`, rejecting
//!   nonsensical values early so the engine never has to.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{AgentSection, ConfigFile, OrchestratorSection, RawConfigFile};
