//! AgentCore implementation

use super::config::AgentConfig;
use super::execution::AgentExecution;
use crate::error::AgentError;
use crate::llm::{ContentBlock, LlmClient, LlmMessage};
use crate::tools::{ToolCall, ToolExecutor, ToolResult};
use std::sync::Arc;
use std::time::Instant;

/// Model plus tools plus prompt: the reasoning loop shared by every agent role.
///
/// `AgentCore` holds no conversation state, so one instance can serve many
/// conversations concurrently; callers own the history they pass to [`run`].
///
/// [`run`]: AgentCore::run
pub struct AgentCore {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
}

impl AgentCore {
    pub fn new(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        tool_executor: ToolExecutor,
    ) -> Self {
        Self {
            config,
            llm_client,
            tool_executor,
        }
    }

    /// Get agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn llm_client(&self) -> &Arc<dyn LlmClient> {
        &self.llm_client
    }

    /// Names of the tools this agent can call, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_executor.list_tools()
    }

    /// `(name, description)` of every tool, used to describe the agent to others
    pub fn tool_skills(&self) -> Vec<(String, String)> {
        self.tool_executor
            .get_tool_definitions()
            .into_iter()
            .map(|d| (d.name, d.description))
            .collect()
    }

    /// Run one task against `history`.
    ///
    /// The user turn, every assistant turn and every tool turn are appended to
    /// `history`, so passing the same vector again continues the conversation.
    pub async fn run(&self, history: &mut Vec<LlmMessage>, task: &str) -> AgentExecution {
        let start_time = Instant::now();
        let elapsed = || start_time.elapsed().as_millis() as u64;
        let agent = self.config.name.as_str();

        tracing::info!(agent, "starting task");
        history.push(LlmMessage::user(task));

        let tool_definitions = self.tool_executor.get_tool_definitions();
        let mut tool_calls = 0;

        for step in 1..=self.config.max_steps {
            let mut messages = Vec::with_capacity(history.len() + 1);
            if !self.config.system_prompt.is_empty() {
                messages.push(LlmMessage::system(self.config.system_prompt.clone()));
            }
            messages.extend(history.iter().cloned());

            let tools = (!tool_definitions.is_empty()).then(|| tool_definitions.clone());
            let response = match self.llm_client.chat_completion(messages, tools, None).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(agent, step, error = %e, "LLM request failed");
                    return AgentExecution::failure(e.to_string(), step, elapsed())
                        .with_tool_calls(tool_calls);
                }
            };

            if let Some(usage) = &response.usage {
                tracing::debug!(
                    agent,
                    step,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "model responded"
                );
            }

            let message = response.message;
            if !message.has_tool_use() {
                let text = message.get_text().unwrap_or_default();
                if text.trim().is_empty() {
                    tracing::warn!(agent, step, "model returned an empty answer");
                    return AgentExecution::failure(
                        AgentError::EmptyResponse.to_string(),
                        step,
                        elapsed(),
                    )
                    .with_tool_calls(tool_calls);
                }

                history.push(message);
                tracing::info!(agent, steps = step, tool_calls, "task completed");
                return AgentExecution::success(text, step, elapsed()).with_tool_calls(tool_calls);
            }

            let calls: Vec<ToolCall> = message
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    parameters: input.clone(),
                })
                .collect();
            history.push(message);

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                tool_calls += 1;
                results.push(self.execute_tool(call).await);
            }
            history.push(LlmMessage::tool_results(results));
        }

        let error = AgentError::MaxStepsExceeded {
            max_steps: self.config.max_steps,
        };
        tracing::warn!(agent, error = %error, "task stopped");
        AgentExecution::failure(error.to_string(), self.config.max_steps, elapsed())
            .with_tool_calls(tool_calls)
    }

    async fn execute_tool(&self, call: ToolCall) -> ContentBlock {
        let id = call.id.clone();
        let name = call.name.clone();
        tracing::info!(agent = %self.config.name, tool = %name, "calling tool");

        let result = match self.tool_executor.execute(call).await {
            Ok(result) => result,
            Err(e) => ToolResult::error(&id, e.to_string()),
        };

        if result.success {
            tracing::debug!(tool = %name, duration_ms = ?result.duration_ms, "tool succeeded");
        } else {
            tracing::warn!(tool = %name, result = %result.content, "tool failed");
        }

        ContentBlock::ToolResult {
            tool_use_id: id,
            is_error: !result.success,
            content: result.content,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{LlmError, Result};
    use crate::llm::{ChatOptions, LlmResponse, MessageRole, ToolDefinition};
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request
    pub(crate) struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<LlmMessage>>>,
        pub requests: Mutex<Vec<(Vec<LlmMessage>, Option<Vec<ToolDefinition>>)>>,
    }

    impl ScriptedLlm {
        pub(crate) fn new(responses: Vec<Result<LlmMessage>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat_completion(
            &self,
            messages: Vec<LlmMessage>,
            tools: Option<Vec<ToolDefinition>>,
            _options: Option<ChatOptions>,
        ) -> Result<LlmResponse> {
            self.requests.lock().unwrap().push((messages, tools));
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(LlmMessage::assistant("out of script")));
            next.map(|message| LlmResponse {
                message,
                usage: None,
                model: "scripted".to_string(),
                finish_reason: None,
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        fn provider_name(&self) -> &str {
            "test"
        }
    }

    pub(crate) fn tool_use(id: &str, name: &str, input: serde_json::Value) -> LlmMessage {
        LlmMessage::assistant_blocks(vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }])
    }

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Upper-case the text"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            let text: String = call.get_parameter("text")?;
            Ok(ToolResult::success(&call.id, text.to_uppercase()))
        }
    }

    fn agent(llm: Arc<ScriptedLlm>, max_steps: usize) -> AgentCore {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(UpperTool));
        AgentCore::new(
            AgentConfig {
                name: "Test".to_string(),
                system_prompt: "Be brief.".to_string(),
                max_steps,
                ..AgentConfig::default()
            },
            llm,
            executor,
        )
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let llm = ScriptedLlm::new(vec![Ok(LlmMessage::assistant("42"))]);
        let core = agent(llm.clone(), 5);
        let mut history = Vec::new();

        let execution = core.run(&mut history, "answer?").await;
        assert!(execution.success);
        assert_eq!(execution.final_result, "42");
        assert_eq!(execution.steps_executed, 1);
        assert_eq!(history.len(), 2);

        let requests = llm.requests.lock().unwrap();
        let (messages, tools) = &requests[0];
        assert_eq!(messages[0], LlmMessage::system("Be brief."));
        assert_eq!(messages[1], LlmMessage::user("answer?"));
        assert_eq!(tools.as_ref().unwrap()[0].name, "upper");
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let llm = ScriptedLlm::new(vec![
            Ok(tool_use("t1", "upper", json!({"text": "hi"}))),
            Ok(LlmMessage::assistant("HI it is")),
        ]);
        let core = agent(llm.clone(), 5);
        let mut history = Vec::new();

        let execution = core.run(&mut history, "shout hi").await;
        assert!(execution.success);
        assert_eq!(execution.steps_executed, 2);
        assert_eq!(execution.tool_calls, 1);

        // user, assistant(tool_use), tool(result), assistant(answer)
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].role, MessageRole::Tool);
        assert_eq!(
            history[2].blocks(),
            vec![ContentBlock::ToolResult {
                tool_use_id: "t1".to_string(),
                is_error: false,
                content: "HI".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let llm = ScriptedLlm::new(vec![
            Ok(tool_use("t1", "missing", json!({}))),
            Ok(LlmMessage::assistant("sorry")),
        ]);
        let core = agent(llm, 5);
        let mut history = Vec::new();

        let execution = core.run(&mut history, "x").await;
        assert!(execution.success);
        match &history[2].blocks()[0] {
            ContentBlock::ToolResult { is_error, content, .. } => {
                assert!(*is_error);
                assert!(content.contains("Tool not found: missing"));
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_max_steps_exceeded() {
        let llm = ScriptedLlm::new(vec![
            Ok(tool_use("t1", "upper", json!({"text": "a"}))),
            Ok(tool_use("t2", "upper", json!({"text": "b"}))),
        ]);
        let core = agent(llm, 2);
        let mut history = Vec::new();

        let execution = core.run(&mut history, "loop").await;
        assert!(!execution.success);
        assert_eq!(execution.steps_executed, 2);
        assert!(execution.final_result.contains("Maximum steps exceeded: 2"));
    }

    #[tokio::test]
    async fn test_llm_error_fails_execution() {
        let llm = ScriptedLlm::new(vec![Err(LlmError::RateLimit.into())]);
        let core = agent(llm, 5);
        let mut history = Vec::new();

        let execution = core.run(&mut history, "x").await;
        assert!(!execution.success);
        assert!(execution.final_result.starts_with("Execution failed: "));
        assert!(execution.final_result.contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_history_carries_over_between_runs() {
        let llm = ScriptedLlm::new(vec![
            Ok(LlmMessage::assistant("first")),
            Ok(LlmMessage::assistant("second")),
        ]);
        let core = agent(llm.clone(), 5);
        let mut history = Vec::new();

        core.run(&mut history, "one").await;
        core.run(&mut history, "two").await;

        let requests = llm.requests.lock().unwrap();
        // system + user + assistant + user
        assert_eq!(requests[1].0.len(), 4);
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_tool_skills() {
        let core = agent(ScriptedLlm::new(Vec::new()), 1);
        assert_eq!(
            core.tool_skills(),
            vec![("upper".to_string(), "Upper-case the text".to_string())]
        );
    }
}
