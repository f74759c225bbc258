//! Web search agent server

use super::serve_agent;
use crate::agents;
use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use switchboard_core::{AgentBuilder, ServerConfig};

pub async fn search_command(config_loader: CliConfigLoader, server: ServerConfig) -> Result<()> {
    let llm_config = config_loader.load().await?;

    let agent = AgentBuilder::new(llm_config)
        .with_agent_config(agents::SEARCH.agent_config())
        .build()
        .context("Failed to build the search agent")?;

    serve_agent(agent, server).await
}
