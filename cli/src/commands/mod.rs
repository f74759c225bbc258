//! CLI command implementations

pub mod client;
pub mod markdown;
pub mod search;
pub mod supervisor;
pub mod tools;

pub use client::client_command;
pub use markdown::markdown_command;
pub use search::search_command;
pub use supervisor::supervisor_command;
pub use tools::tools_command;

use anyhow::{Context, Result};
use std::sync::Arc;
use switchboard_core::{A2aServer, AgentCore, ServerConfig};

/// Publish an agent over A2A until Ctrl-C
async fn serve_agent(agent: AgentCore, server: ServerConfig) -> Result<()> {
    let name = agent.config().name.clone();
    tracing::info!(
        agent = %name,
        tools = ?agent.tool_names(),
        "starting A2A server on {}:{}",
        server.host,
        server.port
    );

    A2aServer::new(Arc::new(agent), server)
        .serve()
        .await
        .with_context(|| format!("{} stopped with an error", name))
}
