//! OpenAI-compatible client implementation using async-openai library

use super::extra_headers;
use crate::config::{ModelParams, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole,
    ToolDefinition, Usage,
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionCall,
        FunctionObject, Stop,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

/// Client for any endpoint speaking the OpenAI Chat Completions protocol
pub struct OpenAiCompatClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: ModelParams,
}

impl OpenAiCompatClient {
    /// Create a new client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for OpenAI".to_string(),
            }
            .into());
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.base_url.trim_end_matches('/'));

        let http_client = reqwest::Client::builder()
            .default_headers(extra_headers(&config.headers)?)
            .build()?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.model.clone(),
            params: config.params.clone(),
        })
    }

    /// Convert our internal message format to async-openai format
    fn convert_messages(messages: Vec<LlmMessage>) -> Vec<ChatCompletionRequestMessage> {
        let mut converted = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => {
                    converted.push(ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage {
                            content: message.get_text().unwrap_or_default().into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::User => {
                    converted.push(ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage {
                            content: message.get_text().unwrap_or_default().into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::Assistant => {
                    let tool_calls: Vec<ChatCompletionMessageToolCall> = message
                        .tool_uses()
                        .into_iter()
                        .map(|(id, name, input)| ChatCompletionMessageToolCall {
                            id: id.to_string(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: name.to_string(),
                                arguments: input.to_string(),
                            },
                        })
                        .collect();

                    converted.push(ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: message
                                .get_text()
                                .map(ChatCompletionRequestAssistantMessageContent::Text),
                            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                            ..Default::default()
                        },
                    ));
                }
                MessageRole::Tool => {
                    // One `tool` message per result
                    for block in message.blocks() {
                        if let ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } = block
                        {
                            converted.push(ChatCompletionRequestMessage::Tool(
                                ChatCompletionRequestToolMessage {
                                    content: ChatCompletionRequestToolMessageContent::Text(
                                        content,
                                    ),
                                    tool_call_id: tool_use_id,
                                },
                            ));
                        }
                    }
                }
            }
        }

        converted
    }

    /// Convert our tool definitions to async-openai format
    fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<ChatCompletionTool> {
        tools
            .into_iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name,
                    description: Some(tool.description),
                    parameters: Some(tool.input_schema),
                    strict: None,
                },
            })
            .collect()
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let options = options.unwrap_or_default();

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(Self::convert_messages(messages));

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            request_builder.tools(Self::convert_tools(tools));
        }
        if let Some(max_tokens) = options.max_tokens.or(self.params.max_tokens) {
            // Compatible servers still expect `max_tokens`
            #[allow(deprecated)]
            request_builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature.or(self.params.temperature) {
            request_builder.temperature(temperature);
        }
        if let Some(top_p) = options.top_p.or(self.params.top_p) {
            request_builder.top_p(top_p);
        }
        if let Some(stop) = options
            .stop
            .or_else(|| self.params.stop_sequences.clone())
        {
            request_builder.stop(Stop::StringArray(stop));
        }

        request_builder.build().map_err(|e| {
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
            .into()
        })
    }

    /// Convert async-openai response to our internal format
    fn convert_response(response: CreateChatCompletionResponse) -> Result<LlmResponse> {
        let choice =
            response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::InvalidResponse {
                    message: "No choices in response".to_string(),
                })?;

        let mut blocks = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            blocks.push(ContentBlock::Text { text });
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            // Arguments arrive as a JSON string; keep the raw text if it does not parse
            let input = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments));
            blocks.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.function.name,
                input,
            });
        }

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ToolCalls => FinishReason::ToolCalls,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            async_openai::types::FinishReason::FunctionCall => FinishReason::ToolCalls,
        });

        Ok(LlmResponse {
            message: LlmMessage::assistant_blocks(blocks),
            usage: response.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: response.model,
            finish_reason,
        })
    }
}

/// async-openai hides HTTP status codes; classify by error payload instead
fn map_openai_error(error: OpenAIError) -> LlmError {
    match error {
        OpenAIError::ApiError(api) => {
            let kind = api
                .code
                .as_deref()
                .or(api.r#type.as_deref())
                .unwrap_or_default();
            match kind {
                "rate_limit_exceeded" | "insufficient_quota" => LlmError::RateLimit,
                "invalid_api_key" | "authentication_error" => LlmError::Authentication {
                    message: api.message,
                },
                _ => LlmError::ApiError {
                    status: 500,
                    message: api.message,
                },
            }
        }
        OpenAIError::Reqwest(e) => LlmError::Network {
            message: e.to_string(),
        },
        OpenAIError::JSONDeserialize(e) => LlmError::InvalidResponse {
            message: format!("Failed to parse response: {}", e),
        },
        other => LlmError::ApiError {
            status: 500,
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options)?;
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion request"
        );

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(error = %e, "OpenAI API call failed");
            map_openai_error(e)
        })?;

        Self::convert_response(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
