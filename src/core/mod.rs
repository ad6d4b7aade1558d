//! Core domain models
//!
//! Stages, structured invocations, pipeline definitions and the run state
//! machine. Nothing here spawns processes or talks to the network.

pub mod config;
pub mod definition;
pub mod pipeline;
pub mod stage;
pub mod state;

pub use config::{ConfigError, IndexServiceConfig, OrchestratorConfig};
pub use pipeline::*;
pub use stage::*;
pub use state::*;
