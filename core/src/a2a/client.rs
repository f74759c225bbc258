//! HTTP client for talking to remote A2A agents

use crate::a2a::types::{
    AgentCard, JsonRpcRequest, JsonRpcResponse, Message, MessageSendParams, SendMessageResult,
    Task, TaskQueryParams, AGENT_CARD_ALT_PATH, AGENT_CARD_PATH,
};
use crate::error::{A2aError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default timeout for A2A calls; remote agents may run long tool loops
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for agent discovery and JSON-RPC calls
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: reqwest::Client,
}

impl A2aClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Fetch the agent card published under `base_url`
    pub async fn fetch_agent_card(&self, base_url: &str) -> Result<AgentCard> {
        let base = normalize_base_url(base_url)?;
        let discovery_error = |message: String| A2aError::Discovery {
            url: base_url.to_string(),
            message,
        };

        for path in [AGENT_CARD_PATH, AGENT_CARD_ALT_PATH] {
            let card_url = format!("{}{}", base, path);
            tracing::debug!(url = %card_url, "fetching agent card");

            let response = self
                .http
                .get(&card_url)
                .send()
                .await
                .map_err(|e| discovery_error(e.to_string()))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            if !response.status().is_success() {
                return Err(discovery_error(format!("HTTP {}", response.status())).into());
            }

            let card = response
                .json::<AgentCard>()
                .await
                .map_err(|e| discovery_error(format!("invalid agent card: {}", e)))?;
            return Ok(card);
        }

        Err(discovery_error("no agent card found".to_string()).into())
    }

    /// Send a text message with `message/send`
    pub async fn send_message(
        &self,
        url: &str,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<SendMessageResult> {
        let message = Message::user_text(text).with_context(context_id.map(String::from), None);
        let params = MessageSendParams {
            message,
            configuration: None,
            metadata: None,
        };
        self.call(url, "message/send", &params).await
    }

    /// Fetch a task previously returned by the agent
    pub async fn get_task(&self, url: &str, task_id: &str) -> Result<Task> {
        let params = TaskQueryParams {
            id: task_id.to_string(),
            history_length: None,
        };
        self.call(url, "tasks/get", &params).await
    }

    /// Issue one JSON-RPC call and decode its result
    pub async fn call<P, R>(&self, url: &str, method: &str, params: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest::new(method, serde_json::to_value(params)?);
        tracing::debug!(%url, %method, "sending A2A request");

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(A2aError::HttpStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| A2aError::InvalidResponse {
            message: e.to_string(),
        })?;

        if let Some(error) = body.error {
            return Err(A2aError::Rpc {
                code: error.code,
                message: error.message,
            }
            .into());
        }

        let result = body.result.ok_or_else(|| A2aError::InvalidResponse {
            message: "response has neither result nor error".to_string(),
        })?;
        serde_json::from_value(result).map_err(|e| {
            A2aError::InvalidResponse {
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Validate an agent base URL and strip the trailing slash
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let parsed = url::Url::parse(base_url.trim()).map_err(|e| A2aError::InvalidUrl {
        url: base_url.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(A2aError::InvalidUrl {
            url: base_url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        }
        .into());
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:5001/").unwrap(),
            "http://localhost:5001"
        );
        assert_eq!(
            normalize_base_url(" https://agents.example.com/search ").unwrap(),
            "https://agents.example.com/search"
        );
        assert!(normalize_base_url("localhost:5001").is_err());
        assert!(normalize_base_url("ftp://example.com").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_a_discovery_error() {
        let client = A2aClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .fetch_agent_card("http://127.0.0.1:9")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to discover agent at http://127.0.0.1:9"));
    }
}
