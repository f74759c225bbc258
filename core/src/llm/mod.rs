//! LLM client abstractions and provider implementations

pub mod client;
pub mod message;
pub mod providers;

pub use client::{ChatOptions, FinishReason, LlmClient, LlmResponse, ToolDefinition, Usage};
pub use message::{ContentBlock, LlmMessage, MessageContent, MessageRole};
pub use providers::{create_llm_client, AnthropicClient, OpenAiCompatClient};
