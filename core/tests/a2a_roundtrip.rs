//! Agents served over real sockets talking to each other

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use switchboard_core::a2a::{SendMessageResult, TaskState, DEFAULT_TIMEOUT};
use switchboard_core::error::{LlmError, Result};
use switchboard_core::llm::{
    ChatOptions, ContentBlock, LlmClient, LlmMessage, LlmResponse, MessageRole, ToolDefinition,
};
use switchboard_core::tools::builtin::A2aClientToolProvider;
use switchboard_core::tools::{ToolCall, ToolExecutor};
use switchboard_core::{A2aClient, A2aServer, AgentBuilder, AgentCore, ServerConfig};
use tokio::net::TcpListener;

fn response(message: LlmMessage) -> LlmResponse {
    LlmResponse {
        message,
        usage: None,
        model: "test".to_string(),
        finish_reason: None,
    }
}

fn user_texts(messages: &[LlmMessage]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .filter_map(|m| m.get_text())
        .collect()
}

/// Answers `echo #<turn>: <last user text>`
struct EchoLlm;

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        _tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let texts = user_texts(&messages);
        let last = texts.last().cloned().unwrap_or_default();
        Ok(response(LlmMessage::assistant(format!(
            "echo #{}: {}",
            texts.len(),
            last
        ))))
    }

    fn model_name(&self) -> &str {
        "echo"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// Forwards the user text to `tool` and answers with whatever came back
struct RelayLlm {
    tool: String,
}

#[async_trait]
impl LlmClient for RelayLlm {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let last = messages.last().map(|m| m.blocks()).unwrap_or_default();
        if let Some(ContentBlock::ToolResult { content, .. }) = last.first() {
            return Ok(response(LlmMessage::assistant(format!(
                "relayed: {}",
                content
            ))));
        }

        let offered = tools.unwrap_or_default();
        assert!(offered.iter().any(|t| t.name == self.tool));

        let text = user_texts(&messages).pop().unwrap_or_default();
        Ok(response(LlmMessage::assistant_blocks(vec![
            ContentBlock::ToolUse {
                id: "relay-1".to_string(),
                name: self.tool.clone(),
                input: json!({ "message": text }),
            },
        ])))
    }

    fn model_name(&self) -> &str {
        "relay"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// Every request hits the rate limit
struct RateLimitedLlm;

#[async_trait]
impl LlmClient for RateLimitedLlm {
    async fn chat_completion(
        &self,
        _messages: Vec<LlmMessage>,
        _tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        Err(LlmError::RateLimit.into())
    }

    fn model_name(&self) -> &str {
        "rate-limited"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

fn echo_agent() -> AgentCore {
    AgentBuilder::from_client(Arc::new(EchoLlm))
        .with_name("Echo Agent")
        .with_description("Repeats what it is told")
        .build()
        .unwrap()
}

/// Serve on an ephemeral port and return the base URL
async fn spawn(agent: AgentCore) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = A2aServer::new(
        Arc::new(agent),
        ServerConfig::new("127.0.0.1", addr.port()),
    );
    tokio::spawn(server.serve_with_listener(listener));
    format!("http://{}", addr)
}

#[tokio::test]
async fn card_is_served_on_both_paths() {
    let url = spawn(echo_agent()).await;
    let http = reqwest::Client::new();

    for path in ["/.well-known/agent.json", "/.well-known/agent-card.json"] {
        let card: Value = http
            .get(format!("{}{}", url, path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(card["name"], "Echo Agent");
        assert_eq!(card["description"], "Repeats what it is told");
        assert_eq!(card["url"], format!("{}/", url));
    }
}

#[tokio::test]
async fn conversation_continues_within_a_context() {
    let url = spawn(echo_agent()).await;
    let client = A2aClient::new(DEFAULT_TIMEOUT).unwrap();

    let first = client.send_message(&url, "hello", None).await.unwrap();
    assert_eq!(first.reply_text().as_deref(), Some("echo #1: hello"));
    let context_id = first.context_id().unwrap().to_string();

    let second = client
        .send_message(&url, "again", Some(&context_id))
        .await
        .unwrap();
    assert_eq!(second.reply_text().as_deref(), Some("echo #2: again"));

    // a fresh context starts over
    let other = client.send_message(&url, "new", None).await.unwrap();
    assert_eq!(other.reply_text().as_deref(), Some("echo #1: new"));

    let SendMessageResult::Task(task) = second else {
        panic!("expected a task");
    };
    assert_eq!(task.status.state, TaskState::Completed);
    let fetched = client.get_task(&url, &task.id).await.unwrap();
    assert_eq!(fetched.id, task.id);
    assert_eq!(fetched.reply_text().as_deref(), Some("echo #2: again"));
}

#[tokio::test]
async fn protocol_errors_are_json_rpc_errors() {
    let url = spawn(echo_agent()).await;
    let http = reqwest::Client::new();

    let unknown: Value = http
        .post(&url)
        .json(&json!({"jsonrpc": "2.0", "id": 7, "method": "agent/dance", "params": {}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unknown["id"], 7);
    assert_eq!(unknown["error"]["code"], -32601);

    let garbage: Value = http
        .post(&url)
        .body("{not json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(garbage["error"]["code"], -32700);

    let missing: Value = http
        .post(&url)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tasks/get", "params": {"id": "nope"}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(missing["error"]["code"], -32001);
}

#[tokio::test]
async fn supervisor_delegates_to_discovered_specialist() {
    let specialist_url = spawn(echo_agent()).await;

    let provider = A2aClientToolProvider::discover(
        &[specialist_url.clone(), "http://127.0.0.1:1".to_string()],
        DEFAULT_TIMEOUT,
    )
    .await
    .unwrap();
    assert_eq!(provider.agents().len(), 1);

    let tools = provider.tools();
    let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    assert!(names.contains(&"call_echo_agent"));
    assert!(names.contains(&"a2a_send_message"));

    let supervisor = AgentBuilder::from_client(Arc::new(RelayLlm {
        tool: "call_echo_agent".to_string(),
    }))
    .with_name("Supervisor Agent")
    .with_extra_tools(tools)
    .build()
    .unwrap();
    let supervisor_url = spawn(supervisor).await;

    // the client side sees the supervisor as one more proxy tool
    let client_side = A2aClientToolProvider::discover(&[supervisor_url], DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let proxies = client_side.tools();
    let proxy = proxies
        .iter()
        .find(|t| t.name() == "call_supervisor_agent")
        .unwrap();

    let result = proxy
        .execute(ToolCall::new(
            "call_supervisor_agent",
            json!({"message": "ping"}),
        ))
        .await
        .unwrap();
    assert!(result.success, "{}", result.content);
    assert_eq!(result.content, "relayed: echo #1: ping");
}

#[tokio::test]
async fn failed_remote_task_is_a_failed_tool_result() {
    let broken = AgentBuilder::from_client(Arc::new(RateLimitedLlm))
        .with_name("Broken Agent")
        .build()
        .unwrap();
    let url = spawn(broken).await;

    let provider = A2aClientToolProvider::discover(&[url], DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let mut executor = ToolExecutor::new();
    executor.register_tools(provider.tools());

    let result = executor
        .execute(ToolCall::new(
            "call_broken_agent",
            json!({"message": "anything"}),
        ))
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.content.starts_with("Error: "), "{}", result.content);
    assert!(result.content.contains("ended as failed"), "{}", result.content);
    assert!(result.content.contains("Rate limit exceeded"), "{}", result.content);

    // the generic send tool reports the same failure
    let result = executor
        .execute(ToolCall::new(
            "a2a_send_message",
            json!({"message_text": "anything", "target_agent_url": provider.agents()[0].base_url}),
        ))
        .await
        .unwrap();
    assert!(!result.success);
}
