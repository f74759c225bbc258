//! A conversation with one agent

use super::base::{Agent, AgentResult};
use super::config::AgentConfig;
use super::core::AgentCore;
use super::execution::AgentExecution;
use crate::llm::LlmMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// An [`AgentCore`] paired with the history of a single conversation
pub struct AgentSession {
    core: Arc<AgentCore>,
    history: Vec<LlmMessage>,
}

impl AgentSession {
    pub fn new(core: Arc<AgentCore>) -> Self {
        Self {
            core,
            history: Vec::new(),
        }
    }

    pub fn core(&self) -> &Arc<AgentCore> {
        &self.core
    }

    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }

    /// Forget the conversation so far
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[async_trait]
impl Agent for AgentSession {
    async fn execute_task(&mut self, task: &str) -> AgentResult<AgentExecution> {
        Ok(self.core.run(&mut self.history, task).await)
    }

    fn config(&self) -> &AgentConfig {
        self.core.config()
    }

    fn agent_type(&self) -> &str {
        "switchboard_agent"
    }
}
