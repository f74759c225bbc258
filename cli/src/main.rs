//! # switchboard CLI
//!
//! Command-line interface for Switchboard - LLM agents that talk to each other
//! over the A2A protocol.
//!
//! ## Usage
//!
//! - `switchboard search` - Serve the web search agent (port 5001)
//! - `switchboard markdown` - Serve the markdown files agent (port 5002)
//! - `switchboard supervisor` - Serve the supervisor that routes to both
//! - `switchboard client` - Chat with the supervisor
//! - `switchboard tools` - Show the local tools

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use switchboard_core::ServerConfig;

mod agents;
mod commands;
mod config;

use commands::{client_command, markdown_command, search_command, supervisor_command, tools_command};
use config::CliConfigLoader;

/// switchboard - LLM agents over the A2A protocol
#[derive(Parser)]
#[command(name = "switchboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search, markdown and supervisor agents talking over A2A")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Protocol to use (anthropic, openai)
    #[arg(long, global = true)]
    protocol: Option<String>,

    /// API key override
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web search agent
    Search {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 5001)]
        port: u16,

        /// URL advertised in the agent card
        #[arg(long)]
        public_url: Option<String>,
    },

    /// Serve the markdown files agent
    Markdown {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 5002)]
        port: u16,

        /// URL advertised in the agent card
        #[arg(long)]
        public_url: Option<String>,

        /// Directory the markdown tools are confined to
        #[arg(long, default_value = "files")]
        files_dir: PathBuf,
    },

    /// Serve the supervisor, which delegates to the specialist agents
    Supervisor {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// URL advertised in the agent card
        #[arg(long)]
        public_url: Option<String>,

        /// Base URL of a specialist agent (repeatable)
        #[arg(
            long = "agent",
            value_name = "URL",
            default_values = ["http://localhost:5001", "http://localhost:5002"]
        )]
        agents: Vec<String>,
    },

    /// Talk to the supervisor, interactively or with a single task
    Client {
        /// Base URL of the supervisor
        #[arg(long, default_value = "http://localhost:5000")]
        supervisor_url: String,

        /// Run this task and exit instead of starting the interactive loop
        task: Option<String>,
    },

    /// Show the local tools of each agent
    Tools,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins unless -v asks for debug output
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_loader = build_config_loader(&cli);

    match cli.command {
        Commands::Search {
            host,
            port,
            public_url,
        } => {
            let server = ServerConfig::new(host, port).with_public_url(public_url);
            search_command(config_loader, server).await
        }
        Commands::Markdown {
            host,
            port,
            public_url,
            files_dir,
        } => {
            let server = ServerConfig::new(host, port).with_public_url(public_url);
            markdown_command(config_loader, server, files_dir).await
        }
        Commands::Supervisor {
            host,
            port,
            public_url,
            agents,
        } => {
            let server = ServerConfig::new(host, port).with_public_url(public_url);
            supervisor_command(config_loader, server, agents).await
        }
        Commands::Client {
            supervisor_url,
            task,
        } => client_command(config_loader, supervisor_url, task).await,
        Commands::Tools => tools_command().await,
    }
}
