//! Agent-to-agent (A2A) protocol: wire types, client and server

pub mod client;
pub mod server;
pub mod types;

pub use client::{A2aClient, DEFAULT_TIMEOUT};
pub use server::{A2aServer, ServerConfig};
pub use types::{AgentCard, AgentSkill, Message, SendMessageResult, Task, TaskState};
