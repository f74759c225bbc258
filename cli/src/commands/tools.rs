//! Tools listing command

use crate::agents;
use anyhow::Result;
use colored::Colorize;
use switchboard_core::tools::ToolRegistry;
use tracing::info;

/// Show the local tools of each agent
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    let registry = ToolRegistry::default();

    for profile in agents::LOCAL {
        println!("{}", profile.name.bold());
        println!("  {}\n", profile.description.dimmed());

        for name in profile.tools {
            if let Some((tool_name, description)) = registry.get_tool_info(name) {
                // Show first line of description only for brevity
                let first_line = description.lines().next().unwrap_or(description);
                println!("  {} {}", tool_name.cyan(), first_line);
            }
        }
        println!();
    }

    println!(
        "The supervisor and the client get their tools from the agents they discover."
    );

    Ok(())
}
