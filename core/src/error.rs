//! Error types and handling for Switchboard Core

use thiserror::Error;

/// Result type alias for Switchboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Switchboard Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Agent-to-agent transport errors
    #[error("A2A error: {0}")]
    A2a(#[from] A2aError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported protocol: {name}")]
    UnsupportedProtocol { name: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Maximum steps exceeded: {max_steps}")]
    MaxStepsExceeded { max_steps: usize },

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Agent-to-agent transport errors
#[derive(Error, Debug)]
pub enum A2aError {
    #[error("Failed to discover agent at {url}: {message}")]
    Discovery { url: String, message: String },

    #[error("No agents discovered at: {urls}")]
    NoAgentsDiscovered { urls: String },

    #[error("Agent not discovered: {url}")]
    UnknownAgent { url: String },

    #[error("Task of agent '{agent}' ended as {state}: {message}")]
    TaskFailed {
        agent: String,
        state: String,
        message: String,
    },

    #[error("Remote agent returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Remote agent returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Invalid A2A response: {message}")]
    InvalidResponse { message: String },

    #[error("Invalid agent URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}
