//! LLM provider implementations

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiCompatClient;

use super::LlmClient;
use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use std::sync::Arc;

/// Create the client matching the configured protocol
pub fn create_llm_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.protocol {
        Protocol::Anthropic => Arc::new(AnthropicClient::new(config)?),
        Protocol::OpenAICompat => Arc::new(OpenAiCompatClient::new(config)?),
    };
    tracing::debug!(
        provider = client.provider_name(),
        model = client.model_name(),
        "created LLM client"
    );
    Ok(client)
}

/// Turn a non-success HTTP response into the matching `LlmError`
pub(crate) async fn error_from_response(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    match status {
        401 | 403 => LlmError::Authentication { message },
        429 => LlmError::RateLimit,
        _ => LlmError::ApiError { status, message },
    }
}

/// Build a reqwest header map from configured extra headers
pub(crate) fn extra_headers(
    headers: &std::collections::HashMap<String, String>,
) -> Result<reqwest::header::HeaderMap> {
    let mut map = reqwest::header::HeaderMap::new();
    for (key, value) in headers {
        let name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            LlmError::InvalidRequest {
                message: format!("Invalid header name '{}': {}", key, e),
            }
        })?;
        let value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
            LlmError::InvalidRequest {
                message: format!("Invalid value for header '{}': {}", key, e),
            }
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
