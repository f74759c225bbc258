//! Markdown files agent server

use super::serve_agent;
use crate::agents;
use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use std::path::PathBuf;
use switchboard_core::tools::ToolRegistry;
use switchboard_core::{AgentBuilder, ServerConfig};

pub async fn markdown_command(
    config_loader: CliConfigLoader,
    server: ServerConfig,
    files_dir: PathBuf,
) -> Result<()> {
    let llm_config = config_loader.load().await?;
    tracing::info!(files_dir = %files_dir.display(), "markdown files directory");

    let agent = AgentBuilder::new(llm_config)
        .with_agent_config(agents::MARKDOWN.agent_config())
        .with_registry(ToolRegistry::with_files_dir(files_dir))
        .build()
        .context("Failed to build the markdown agent")?;

    serve_agent(agent, server).await
}
