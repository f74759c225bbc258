//! Client command: talk to the supervisor through its proxy tools

use crate::agents;
use crate::config::CliConfigLoader;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::a2a::DEFAULT_TIMEOUT;
use switchboard_core::error::A2aError;
use switchboard_core::tools::builtin::A2aClientToolProvider;
use switchboard_core::{Agent, AgentBuilder, AgentExecution, AgentSession};
use tokio::io::{AsyncBufReadExt, BufReader};

const EXAMPLE_TASK: &str =
    "Search for the latest news on AI hardware and create a summary in a file named ai_news.md";

pub async fn client_command(
    config_loader: CliConfigLoader,
    supervisor_url: String,
    task: Option<String>,
) -> Result<()> {
    let provider = A2aClientToolProvider::discover(&[supervisor_url.clone()], DEFAULT_TIMEOUT)
        .await
        .context("Failed to set up the A2A client")?;

    let tools = provider.tools();
    if tools.is_empty() {
        return Err(anyhow::Error::new(A2aError::NoAgentsDiscovered {
            urls: supervisor_url,
        })
        .context("Could not connect to the supervisor"));
    }
    let tool_names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    tracing::info!(tools = ?tool_names, "discovered supervisor tools");

    let llm_config = config_loader.load().await?;
    let agent = AgentBuilder::new(llm_config)
        .with_agent_config(agents::CLIENT.agent_config())
        .with_extra_tools(tools)
        .build()
        .context("Failed to build the client agent")?;
    let mut session = AgentSession::new(Arc::new(agent));

    match task {
        Some(task) => {
            let execution = run_with_spinner(&mut session, &task).await?;
            if !execution.success {
                bail!("{}", execution.final_result);
            }
            print_answer(&execution.final_result);
            Ok(())
        }
        None => interactive_loop(&mut session).await,
    }
}

async fn interactive_loop(session: &mut AgentSession) -> Result<()> {
    println!("\n{}", "Connected to the supervisor.".green().bold());
    println!("You can now give it complex, multi-step tasks.");
    println!("Example: '{}'", EXAMPLE_TASK);
    println!("Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                break;
            }
        };

        // EOF
        let Some(line) = line else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        let result = tokio::select! {
            result = run_with_spinner(session, input) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                break;
            }
        };

        match result {
            Ok(execution) if execution.success => print_answer(&execution.final_result),
            Ok(execution) => {
                tracing::error!(error = %execution.final_result, "the conversation failed");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "the conversation failed");
                break;
            }
        }
    }

    Ok(())
}

async fn run_with_spinner(session: &mut AgentSession, task: &str) -> Result<AgentExecution> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Thinking and working on the task...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = session.execute_task(task).await;
    spinner.finish_and_clear();

    let execution = result?;
    tracing::debug!(
        steps = execution.steps_executed,
        tool_calls = execution.tool_calls,
        duration_ms = execution.duration_ms,
        "task finished"
    );
    Ok(execution)
}

fn print_answer(answer: &str) {
    println!("\n{}", "--- Final answer ---".bold().green());
    println!("{}", answer);
    println!("{}", "-".repeat(20));
}
