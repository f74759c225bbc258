//! A2A server exposing one agent over HTTP JSON-RPC

use crate::a2a::types::{
    AgentCapabilities, AgentCard, AgentSkill, Artifact, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, Message, MessageSendParams, Part, Task, TaskIdParams, TaskKind,
    TaskQueryParams, TaskState, TaskStatus, AGENT_CARD_ALT_PATH, AGENT_CARD_PATH,
    JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::agent::AgentCore;
use crate::error::Result;
use crate::llm::LlmMessage;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Number of finished tasks and conversations kept in memory
pub const DEFAULT_RETENTION: usize = 1000;

/// Where and how an agent is served
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// URL advertised on the agent card; derived from the bound address when unset
    pub public_url: Option<String>,
    pub retention: usize,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            public_url: None,
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// Advertised URL for a server bound to `addr`
    pub fn advertised_url(&self, addr: SocketAddr) -> String {
        if let Some(url) = &self.public_url {
            return url.clone();
        }
        let host = if addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            addr.ip().to_string()
        };
        format!("http://{}:{}/", host, addr.port())
    }
}

/// Insertion-ordered map that drops its oldest entry when full
struct Bounded<V> {
    capacity: usize,
    order: VecDeque<String>,
    items: HashMap<String, V>,
}

impl<V: Clone> Bounded<V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            items: HashMap::new(),
        }
    }

    fn get(&self, key: &str) -> Option<V> {
        self.items.get(key).cloned()
    }

    fn insert(&mut self, key: String, value: V) {
        if self.items.insert(key.clone(), value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.items.remove(&oldest);
            }
        }
    }
}

type History = Arc<tokio::sync::Mutex<Vec<LlmMessage>>>;

struct ServerState {
    agent: Arc<AgentCore>,
    card: AgentCard,
    contexts: Mutex<Bounded<History>>,
    tasks: Mutex<Bounded<Task>>,
}

impl ServerState {
    fn history(&self, context_id: &str) -> History {
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(history) = contexts.get(context_id) {
            return history;
        }
        let history: History = Arc::default();
        contexts.insert(context_id.to_string(), history.clone());
        history
    }

    fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(task_id)
    }

    fn store_task(&self, task: Task) {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(task.id.clone(), task);
    }
}

/// Serves an [`AgentCore`] as an A2A agent
pub struct A2aServer {
    agent: Arc<AgentCore>,
    config: ServerConfig,
}

impl A2aServer {
    pub fn new(agent: Arc<AgentCore>, config: ServerConfig) -> Self {
        Self { agent, config }
    }

    /// Agent card advertising `url`, with one skill per tool
    pub fn agent_card(&self, url: &str) -> AgentCard {
        let agent_config = self.agent.config();
        let skills = self
            .agent
            .tool_skills()
            .into_iter()
            .map(|(name, description)| AgentSkill {
                id: name.clone(),
                name,
                description,
                tags: Vec::new(),
            })
            .collect();

        AgentCard {
            name: agent_config.name.clone(),
            description: agent_config.description.clone(),
            url: url.to_string(),
            version: crate::VERSION.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: AgentCapabilities::default(),
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills,
        }
    }

    /// Router serving the card and the JSON-RPC endpoint
    pub fn router(&self, public_url: &str) -> Router {
        let state = Arc::new(ServerState {
            agent: self.agent.clone(),
            card: self.agent_card(public_url),
            contexts: Mutex::new(Bounded::new(self.config.retention)),
            tasks: Mutex::new(Bounded::new(self.config.retention)),
        });

        Router::new()
            .route("/", post(handle_rpc))
            .route(AGENT_CARD_PATH, get(handle_card))
            .route(AGENT_CARD_ALT_PATH, get(handle_card))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured host and port and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve_with_listener(listener).await
    }

    /// Serve on an already bound listener until Ctrl-C
    pub async fn serve_with_listener(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let public_url = self.config.advertised_url(local_addr);
        let router = self.router(&public_url);

        tracing::info!(
            agent = %self.agent.config().name,
            addr = %local_addr,
            url = %public_url,
            tools = ?self.agent.tool_names(),
            "A2A server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutting down A2A server");
                }
            })
            .await?;
        Ok(())
    }
}

async fn handle_card(State(state): State<Arc<ServerState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn handle_rpc(State(state): State<Arc<ServerState>>, body: Bytes) -> Json<JsonRpcResponse> {
    Json(dispatch(&state, &body).await)
}

async fn dispatch(state: &ServerState, body: &[u8]) -> JsonRpcResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => return JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e)),
    };
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => return JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e)),
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return JsonRpcResponse::failure(
            id,
            JsonRpcError::invalid_request(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
        );
    }

    tracing::debug!(method = %request.method, "A2A request");
    let outcome = match request.method.as_str() {
        "message/send" => match params::<MessageSendParams>(&request) {
            Ok(params) => send_message(state, params).await,
            Err(e) => Err(e),
        },
        "tasks/get" => params::<TaskQueryParams>(&request).and_then(|p| get_task(state, p)),
        "tasks/cancel" => params::<TaskIdParams>(&request).and_then(|p| cancel_task(state, p)),
        "message/stream"
        | "tasks/resubscribe"
        | "tasks/pushNotificationConfig/set"
        | "tasks/pushNotificationConfig/get"
        | "tasks/pushNotificationConfig/list"
        | "tasks/pushNotificationConfig/delete"
        | "agent/getAuthenticatedExtendedCard" => {
            Err(JsonRpcError::unsupported_operation(&request.method))
        }
        other => Err(JsonRpcError::method_not_found(other)),
    };

    match outcome {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(error) => {
            tracing::debug!(code = error.code, message = %error.message, "A2A request failed");
            JsonRpcResponse::failure(request.id, error)
        }
    }
}

fn params<P: DeserializeOwned>(request: &JsonRpcRequest) -> std::result::Result<P, JsonRpcError> {
    let raw = request.params.clone().unwrap_or(Value::Null);
    serde_json::from_value(raw).map_err(JsonRpcError::invalid_params)
}

fn to_result(task: &Task) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(task).map_err(JsonRpcError::internal_error)
}

async fn send_message(
    state: &ServerState,
    params: MessageSendParams,
) -> std::result::Result<Value, JsonRpcError> {
    let text = params
        .message
        .text()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| JsonRpcError::invalid_params("message has no text parts"))?;

    let context_id = params
        .message
        .context_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let task_id = Uuid::new_v4().to_string();

    let mut user_message = params.message;
    user_message.context_id = Some(context_id.clone());
    user_message.task_id = Some(task_id.clone());

    tracing::info!(context_id = %context_id, task_id = %task_id, "running task");
    let history = state.history(&context_id);
    let execution = {
        let mut history = history.lock().await;
        state.agent.run(&mut history, &text).await
    };

    let reply = Message::agent_text(execution.final_result.clone())
        .with_context(Some(context_id.clone()), Some(task_id.clone()));

    let task = if execution.success {
        Task {
            kind: TaskKind::Task,
            id: task_id,
            context_id,
            status: TaskStatus::now(TaskState::Completed, None),
            artifacts: vec![Artifact {
                artifact_id: Uuid::new_v4().to_string(),
                name: Some("agent_response".to_string()),
                description: None,
                parts: vec![Part::text(execution.final_result)],
            }],
            history: vec![user_message, reply],
            metadata: None,
        }
    } else {
        tracing::warn!(task_id = %task_id, result = %execution.final_result, "task failed");
        Task {
            kind: TaskKind::Task,
            id: task_id,
            context_id,
            status: TaskStatus::now(TaskState::Failed, Some(reply.clone())),
            artifacts: Vec::new(),
            history: vec![user_message, reply],
            metadata: None,
        }
    };

    let result = to_result(&task);
    state.store_task(task);
    result
}

fn get_task(
    state: &ServerState,
    params: TaskQueryParams,
) -> std::result::Result<Value, JsonRpcError> {
    let mut task = state
        .task(&params.id)
        .ok_or_else(|| JsonRpcError::task_not_found(&params.id))?;

    if let Some(limit) = params.history_length {
        let skip = task.history.len().saturating_sub(limit);
        task.history.drain(..skip);
    }
    to_result(&task)
}

fn cancel_task(
    state: &ServerState,
    params: TaskIdParams,
) -> std::result::Result<Value, JsonRpcError> {
    // Tasks finish before `message/send` returns, so there is never anything to cancel.
    match state.task(&params.id) {
        Some(_) => Err(JsonRpcError::task_not_cancelable(&params.id)),
        None => Err(JsonRpcError::task_not_found(&params.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::types::{
        METHOD_NOT_FOUND, PARSE_ERROR, TASK_NOT_CANCELABLE, TASK_NOT_FOUND, UNSUPPORTED_OPERATION,
    };
    use crate::agent::core::tests::ScriptedLlm;
    use crate::agent::AgentConfig;
    use crate::error::LlmError;
    use crate::tools::{ToolExecutor, ToolRegistry};
    use serde_json::json;

    fn state(responses: Vec<crate::error::Result<LlmMessage>>) -> (Arc<ScriptedLlm>, ServerState) {
        let llm = ScriptedLlm::new(responses);
        let tmp = std::env::temp_dir();
        let executor: ToolExecutor = ToolRegistry::with_files_dir(tmp).create_executor(&["websearch"]);
        let agent = Arc::new(AgentCore::new(
            AgentConfig {
                name: "Search Agent".to_string(),
                description: "Searches the web".to_string(),
                ..AgentConfig::default()
            },
            llm.clone(),
            executor,
        ));
        let server = A2aServer::new(agent.clone(), ServerConfig::new("127.0.0.1", 0));
        let state = ServerState {
            agent,
            card: server.agent_card("http://localhost:5001/"),
            contexts: Mutex::new(Bounded::new(2)),
            tasks: Mutex::new(Bounded::new(2)),
        };
        (llm, state)
    }

    fn send_body(text: &str, context_id: Option<&str>) -> Vec<u8> {
        let mut message = json!({
            "kind": "message",
            "role": "user",
            "parts": [{"kind": "text", "text": text}],
            "messageId": "m-1"
        });
        if let Some(ctx) = context_id {
            message["contextId"] = json!(ctx);
        }
        serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "message/send",
            "params": {"message": message}
        }))
        .unwrap()
    }

    fn rpc(method: &str, params: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({"jsonrpc": "2.0", "id": "x", "method": method, "params": params}))
            .unwrap()
    }

    #[test]
    fn test_card_lists_tools_as_skills() {
        let (_, state) = state(Vec::new());
        assert_eq!(state.card.name, "Search Agent");
        assert_eq!(state.card.url, "http://localhost:5001/");
        assert_eq!(state.card.skills.len(), 1);
        assert_eq!(state.card.skills[0].id, "websearch");
        assert!(!state.card.capabilities.streaming);
    }

    #[test]
    fn test_advertised_url() {
        let config = ServerConfig::new("0.0.0.0", 5001);
        let addr: SocketAddr = "0.0.0.0:5001".parse().unwrap();
        assert_eq!(config.advertised_url(addr), "http://localhost:5001/");

        let config = config.with_public_url(Some("https://search.example.com/".to_string()));
        assert_eq!(config.advertised_url(addr), "https://search.example.com/");
    }

    #[tokio::test]
    async fn test_message_send_completes_task() {
        let (_, state) = state(vec![Ok(LlmMessage::assistant("Paris"))]);
        let response = dispatch(&state, &send_body("capital of France?", None)).await;

        assert_eq!(response.id, json!(7));
        assert!(response.error.is_none());
        let task: Task = serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(task.artifacts[0].name.as_deref(), Some("agent_response"));
        assert_eq!(task.reply_text().as_deref(), Some("Paris"));
        assert_eq!(task.history.len(), 2);

        let fetched = dispatch(&state, &rpc("tasks/get", json!({"id": task.id, "historyLength": 1}))).await;
        let fetched: Task = serde_json::from_value(fetched.result.unwrap()).unwrap();
        assert_eq!(fetched.history.len(), 1);

        let cancel = dispatch(&state, &rpc("tasks/cancel", json!({"id": task.id}))).await;
        assert_eq!(cancel.error.unwrap().code, TASK_NOT_CANCELABLE);
    }

    #[tokio::test]
    async fn test_context_keeps_conversation() {
        let (llm, state) = state(vec![
            Ok(LlmMessage::assistant("one")),
            Ok(LlmMessage::assistant("two")),
            Ok(LlmMessage::assistant("fresh")),
        ]);

        dispatch(&state, &send_body("first", Some("ctx-1"))).await;
        dispatch(&state, &send_body("second", Some("ctx-1"))).await;
        dispatch(&state, &send_body("other", Some("ctx-2"))).await;

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[1].0.len(), 3);
        assert_eq!(requests[2].0.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_run_returns_failed_task() {
        let (_, state) = state(vec![Err(LlmError::RateLimit.into())]);
        let response = dispatch(&state, &send_body("x", None)).await;

        let task: Task = serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(task.status.state, TaskState::Failed);
        assert!(task.artifacts.is_empty());
        assert!(task.reply_text().unwrap().contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (_, state) = state(Vec::new());

        let response = dispatch(&state, b"{not json").await;
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let response = dispatch(&state, &rpc("message/stream", json!({}))).await;
        assert_eq!(response.error.unwrap().code, UNSUPPORTED_OPERATION);

        let response = dispatch(&state, &rpc("agents/dance", json!({}))).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

        let response = dispatch(&state, &rpc("tasks/get", json!({"id": "nope"}))).await;
        assert_eq!(response.error.unwrap().code, TASK_NOT_FOUND);

        let response = dispatch(&state, &rpc("tasks/cancel", json!({"id": "nope"}))).await;
        assert_eq!(response.error.unwrap().code, TASK_NOT_FOUND);

        let response = dispatch(&state, &rpc("message/send", json!({"message": {"role": "user"}}))).await;
        assert_eq!(response.error.unwrap().code, crate::a2a::types::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_task_store_evicts_oldest() {
        let (_, state) = state(vec![
            Ok(LlmMessage::assistant("a")),
            Ok(LlmMessage::assistant("b")),
            Ok(LlmMessage::assistant("c")),
        ]);

        let mut ids = Vec::new();
        for text in ["1", "2", "3"] {
            let response = dispatch(&state, &send_body(text, None)).await;
            let task: Task = serde_json::from_value(response.result.unwrap()).unwrap();
            ids.push(task.id);
        }

        assert!(state.task(&ids[0]).is_none());
        assert!(state.task(&ids[1]).is_some());
        assert!(state.task(&ids[2]).is_some());
    }
}
