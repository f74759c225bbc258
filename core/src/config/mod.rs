//! Configuration types for switchboard core
//!
//! Only exports resolved data types. Discovery and loading live in the CLI layer.

pub mod types;

pub use types::{ModelParams, Protocol, ResolvedLlmConfig};
