//! # Switchboard Core
//!
//! Core library for Switchboard - a small set of LLM agents that talk to each
//! other over the A2A (agent-to-agent) protocol.
//!
//! This library provides the building blocks every agent role is made of:
//! LLM provider clients, the tool system (markdown files, web search and A2A
//! proxy tools), the agent execution loop, and the A2A client and server.

pub mod a2a;
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

// Re-export commonly used types
pub use a2a::{A2aClient, A2aServer, AgentCard, ServerConfig};
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentCore, AgentExecution, AgentSession};
pub use config::{ModelParams, Protocol, ResolvedLlmConfig};
pub use error::{Error, Result};

/// Current version of the switchboard-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
