//! Supervisor agent server

use super::serve_agent;
use crate::agents;
use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use switchboard_core::a2a::DEFAULT_TIMEOUT;
use switchboard_core::error::A2aError;
use switchboard_core::tools::builtin::A2aClientToolProvider;
use switchboard_core::{AgentBuilder, ServerConfig};

pub async fn supervisor_command(
    config_loader: CliConfigLoader,
    server: ServerConfig,
    agent_urls: Vec<String>,
) -> Result<()> {
    let provider = A2aClientToolProvider::discover(&agent_urls, DEFAULT_TIMEOUT)
        .await
        .context("Failed to set up the A2A client")?;

    let tools = provider.tools();
    if tools.is_empty() {
        return Err(anyhow::Error::new(A2aError::NoAgentsDiscovered {
            urls: agent_urls.join(", "),
        })
        .context("No specialist agents could be discovered"));
    }
    let tool_names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    tracing::info!(tools = ?tool_names, "specialist tools available");

    let llm_config = config_loader.load().await?;
    let agent = AgentBuilder::new(llm_config)
        .with_agent_config(agents::SUPERVISOR.agent_config())
        .with_extra_tools(tools)
        .build()
        .context("Failed to build the supervisor agent")?;

    serve_agent(agent, server).await
}
