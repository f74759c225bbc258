//! Agent core logic and execution engine

pub mod base;
pub mod config;
pub mod core;
pub mod execution;
pub mod session;

pub use base::{Agent, AgentResult};
pub use config::{AgentBuilder, AgentConfig, DEFAULT_MAX_STEPS};
pub use core::AgentCore;
pub use execution::AgentExecution;
pub use session::AgentSession;
