//! Tools that let an agent call remote A2A agents

use crate::a2a::client::normalize_base_url;
use crate::a2a::{A2aClient, AgentCard, SendMessageResult};
use crate::error::{A2aError, Result};
use crate::tools::{Tool, ToolCall, ToolExample, ToolResult};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// A remote agent found through its card
#[derive(Debug, Clone)]
pub struct DiscoveredAgent {
    /// URL the card was fetched from, without trailing slash
    pub base_url: String,
    pub card: AgentCard,
}

impl DiscoveredAgent {
    /// Where JSON-RPC calls go: the advertised URL, else the discovery URL
    pub fn endpoint(&self) -> &str {
        if self.card.url.trim().is_empty() {
            &self.base_url
        } else {
            &self.card.url
        }
    }

    fn matches(&self, url: &str) -> bool {
        let wanted = url.trim().trim_end_matches('/');
        wanted == self.base_url || wanted == self.card.url.trim_end_matches('/')
    }

    fn summary(&self) -> serde_json::Value {
        json!({
            "name": self.card.name,
            "description": self.card.description,
            "url": self.endpoint(),
            "skills": self.card.skills.iter().map(|s| json!({
                "name": s.name,
                "description": s.description,
            })).collect::<Vec<_>>(),
        })
    }
}

struct ProviderState {
    client: A2aClient,
    agents: RwLock<Vec<DiscoveredAgent>>,
}

impl ProviderState {
    fn agents(&self) -> Vec<DiscoveredAgent> {
        self.agents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn find(&self, url: &str) -> Option<DiscoveredAgent> {
        self.agents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|a| a.matches(url))
            .cloned()
    }

    async fn fetch(&self, url: &str) -> Result<DiscoveredAgent> {
        let base_url = normalize_base_url(url)?;
        let card = self.client.fetch_agent_card(&base_url).await?;
        Ok(DiscoveredAgent { base_url, card })
    }

    /// Add or replace the agent with the same base URL
    fn insert(&self, agent: DiscoveredAgent) {
        let mut agents = self.agents.write().unwrap_or_else(|e| e.into_inner());
        match agents.iter_mut().find(|a| a.base_url == agent.base_url) {
            Some(existing) => *existing = agent,
            None => agents.push(agent),
        }
    }

    async fn discover(&self, url: &str) -> Result<DiscoveredAgent> {
        let agent = self.fetch(url).await?;
        self.insert(agent.clone());
        Ok(agent)
    }

    async fn send(&self, agent: &DiscoveredAgent, text: &str) -> Result<String> {
        tracing::info!(agent = %agent.card.name, url = %agent.endpoint(), "sending A2A message");
        let result = self.client.send_message(agent.endpoint(), text, None).await?;
        if let SendMessageResult::Task(task) = &result {
            let state = task.status.state;
            if state.is_unsuccessful() {
                tracing::warn!(
                    agent = %agent.card.name,
                    task = %task.id,
                    state = state.as_str(),
                    "remote task did not complete"
                );
                return Err(A2aError::TaskFailed {
                    agent: agent.card.name.clone(),
                    state: state.as_str().to_string(),
                    message: task.reply_text().unwrap_or_default(),
                }
                .into());
            }
        }
        result.reply_text().ok_or_else(|| {
            A2aError::InvalidResponse {
                message: format!("agent '{}' replied without text", agent.card.name),
            }
            .into()
        })
    }
}

/// Discovers remote agents and turns them into tools
#[derive(Clone)]
pub struct A2aClientToolProvider {
    state: Arc<ProviderState>,
}

impl A2aClientToolProvider {
    /// Fetch the card of every URL; unreachable agents are logged and skipped
    pub async fn discover(known_agent_urls: &[String], timeout: Duration) -> Result<Self> {
        let provider = Self {
            state: Arc::new(ProviderState {
                client: A2aClient::new(timeout)?,
                agents: RwLock::new(Vec::new()),
            }),
        };

        // Cards are fetched concurrently but registered in the given order
        let fetched = join_all(known_agent_urls.iter().map(|url| provider.state.fetch(url))).await;
        for (url, outcome) in known_agent_urls.iter().zip(fetched) {
            match outcome {
                Ok(agent) => {
                    tracing::info!(
                        agent = %agent.card.name,
                        url = %agent.endpoint(),
                        skills = agent.card.skills.len(),
                        "discovered agent"
                    );
                    provider.state.insert(agent);
                }
                Err(e) => tracing::warn!(%url, error = %e, "skipping agent"),
            }
        }

        Ok(provider)
    }

    pub fn agents(&self) -> Vec<DiscoveredAgent> {
        self.state.agents()
    }

    /// One proxy tool per discovered agent plus the generic A2A tools.
    ///
    /// Empty when nothing was discovered.
    pub fn tools(&self) -> Vec<Box<dyn Tool>> {
        let agents = self.state.agents();
        if agents.is_empty() {
            return Vec::new();
        }

        let mut tools: Vec<Box<dyn Tool>> = Vec::new();
        let mut taken: Vec<String> = Vec::new();
        for agent in agents {
            let mut name = format!("call_{}", snake_case(&agent.card.name));
            let base = name.clone();
            let mut n = 2;
            while taken.contains(&name) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            taken.push(name.clone());
            tools.push(Box::new(AgentProxyTool::new(name, agent, self.state.clone())));
        }

        tools.push(Box::new(DiscoverAgentTool {
            state: self.state.clone(),
        }));
        tools.push(Box::new(ListAgentsTool {
            state: self.state.clone(),
        }));
        tools.push(Box::new(SendMessageTool {
            state: self.state.clone(),
        }));
        tools
    }
}

/// `Markdown Agent` becomes `markdown_agent`
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch.to_ascii_lowercase());
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "agent".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Forwards a message to one specific agent
pub struct AgentProxyTool {
    name: String,
    description: String,
    agent: DiscoveredAgent,
    state: Arc<ProviderState>,
}

impl AgentProxyTool {
    fn new(name: String, agent: DiscoveredAgent, state: Arc<ProviderState>) -> Self {
        let mut description = if agent.card.description.is_empty() {
            format!("Send a message to the remote agent '{}'.", agent.card.name)
        } else {
            agent.card.description.clone()
        };
        if !agent.card.skills.is_empty() {
            description.push_str("\n\nSkills:");
            for skill in &agent.card.skills {
                description.push_str(&format!("\n- {}: {}", skill.name, skill.description));
            }
        }

        Self {
            name,
            description,
            agent,
            state,
        }
    }
}

#[async_trait]
impl Tool for AgentProxyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": format!("The request for {}", self.agent.card.name)
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let message: String = call.get_parameter("message")?;
        let reply = self.state.send(&self.agent, &message).await?;
        Ok(ToolResult::success(&call.id, reply))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: format!("Delegate a request to {}", self.agent.card.name),
            parameters: json!({"message": "..."}),
            expected_result: "The remote agent's answer".to_string(),
        }]
    }
}

/// `a2a_discover_agent`
pub struct DiscoverAgentTool {
    state: Arc<ProviderState>,
}

#[async_trait]
impl Tool for DiscoverAgentTool {
    fn name(&self) -> &str {
        "a2a_discover_agent"
    }

    fn description(&self) -> &str {
        "Discover an A2A agent by URL and fetch its agent card. \
         Discovered agents can be reached with a2a_send_message."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Base URL of the agent, e.g. http://localhost:5001"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let url: String = call.get_parameter("url")?;
        let agent = self.state.discover(&url).await?;
        let summary = agent.summary();
        Ok(ToolResult::success(&call.id, serde_json::to_string_pretty(&summary)?).with_data(summary))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Discover the search agent".to_string(),
            parameters: json!({"url": "http://localhost:5001"}),
            expected_result: "{\"name\": \"Search Agent\", ...}".to_string(),
        }]
    }
}

/// `a2a_list_discovered_agents`
pub struct ListAgentsTool {
    state: Arc<ProviderState>,
}

#[async_trait]
impl Tool for ListAgentsTool {
    fn name(&self) -> &str {
        "a2a_list_discovered_agents"
    }

    fn description(&self) -> &str {
        "List all discovered A2A agents with their descriptions and skills."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let agents: Vec<serde_json::Value> =
            self.state.agents().iter().map(|a| a.summary()).collect();
        let data = json!({ "agents": agents, "total_count": agents.len() });
        Ok(ToolResult::success(&call.id, serde_json::to_string_pretty(&data)?).with_data(data))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "See which agents are available".to_string(),
            parameters: json!({}),
            expected_result: "{\"agents\": [...], \"total_count\": 2}".to_string(),
        }]
    }
}

/// `a2a_send_message`
pub struct SendMessageTool {
    state: Arc<ProviderState>,
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "a2a_send_message"
    }

    fn description(&self) -> &str {
        "Send a message to a discovered A2A agent and return its reply."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "message_text": {
                    "type": "string",
                    "description": "The message to send"
                },
                "target_agent_url": {
                    "type": "string",
                    "description": "URL of a discovered agent"
                }
            },
            "required": ["message_text", "target_agent_url"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let text: String = call.get_parameter("message_text")?;
        let url: String = call.get_parameter("target_agent_url")?;
        let agent = self
            .state
            .find(&url)
            .ok_or(A2aError::UnknownAgent { url: url.clone() })?;

        let reply = self.state.send(&agent, &text).await?;
        Ok(ToolResult::success(&call.id, reply))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Ask the markdown agent to list its files".to_string(),
            parameters: json!({
                "message_text": "List all markdown files",
                "target_agent_url": "http://localhost:5002"
            }),
            expected_result: "Markdown files in 'files' directory: ...".to_string(),
        }]
    }
}
