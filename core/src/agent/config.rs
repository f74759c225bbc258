//! Agent configuration structures

use super::core::AgentCore;
use crate::config::ResolvedLlmConfig;
use crate::error::Result;
use crate::llm::{create_llm_client, LlmClient};
use crate::tools::{Tool, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Step limit applied when none is configured
pub const DEFAULT_MAX_STEPS: usize = 50;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name, also published on the agent card
    pub name: String,

    /// One-line description of what the agent does
    #[serde(default)]
    pub description: String,

    /// System prompt sent with every model call
    #[serde(default)]
    pub system_prompt: String,

    /// Maximum number of model calls per task
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Names of registry tools available to this agent
    #[serde(default)]
    pub tools: Vec<String>,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Agent".to_string(),
            description: String::new(),
            system_prompt: String::new(),
            max_steps: DEFAULT_MAX_STEPS,
            tools: Vec::new(),
        }
    }
}

enum LlmSource {
    Config(ResolvedLlmConfig),
    Client(Arc<dyn LlmClient>),
}

/// Builder for creating agents with resolved LLM configuration
pub struct AgentBuilder {
    llm: LlmSource,
    agent_config: AgentConfig,
    registry: Option<ToolRegistry>,
    extra_tools: Vec<Box<dyn Tool>>,
}

impl AgentBuilder {
    /// Create a new agent builder with LLM configuration
    pub fn new(llm_config: ResolvedLlmConfig) -> Self {
        Self::with_source(LlmSource::Config(llm_config))
    }

    /// Create a builder around an existing LLM client
    pub fn from_client(llm_client: Arc<dyn LlmClient>) -> Self {
        Self::with_source(LlmSource::Client(llm_client))
    }

    fn with_source(llm: LlmSource) -> Self {
        Self {
            llm,
            agent_config: AgentConfig::default(),
            registry: None,
            extra_tools: Vec::new(),
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.agent_config.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.agent_config.description = description.into();
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.agent_config.system_prompt = system_prompt.into();
        self
    }

    /// Set maximum steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.agent_config.max_steps = max_steps;
        self
    }

    /// Set the registry tools by name
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.agent_config.tools = tools;
        self
    }

    /// Resolve tool names against this registry instead of the default one
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add tools that are not produced by a registry, such as A2A proxies
    pub fn with_extra_tools(mut self, tools: Vec<Box<dyn Tool>>) -> Self {
        self.extra_tools.extend(tools);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<AgentCore> {
        let llm_client = match self.llm {
            LlmSource::Config(config) => {
                config.validate()?;
                create_llm_client(&config)?
            }
            LlmSource::Client(client) => client,
        };

        let registry = self.registry.unwrap_or_default();
        let mut tool_executor = registry.create_executor(&self.agent_config.tools);
        tool_executor.register_tools(self.extra_tools);

        Ok(AgentCore::new(self.agent_config, llm_client, tool_executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.max_steps, 50);
        assert!(config.tools.is_empty());

        let parsed: AgentConfig = serde_json::from_str(r#"{"name": "Search"}"#).unwrap();
        assert_eq!(parsed.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn test_build_rejects_invalid_llm_config() {
        let llm = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com".to_string(),
            String::new(),
            "claude-sonnet-4-20250514".to_string(),
        );
        let err = AgentBuilder::new(llm).build().err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_build_resolves_registry_tools() {
        let tmp = tempfile::TempDir::new().unwrap();
        let llm = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com".to_string(),
            "sk-test".to_string(),
            "claude-sonnet-4-20250514".to_string(),
        );

        let agent = AgentBuilder::new(llm)
            .with_name("Markdown Agent")
            .with_tools(vec![
                "list_markdown_files".to_string(),
                "read_markdown_file".to_string(),
            ])
            .with_registry(ToolRegistry::with_files_dir(tmp.path()))
            .build()
            .unwrap();

        assert_eq!(agent.config().name, "Markdown Agent");
        assert_eq!(
            agent.tool_names(),
            vec!["list_markdown_files", "read_markdown_file"]
        );
    }
}
