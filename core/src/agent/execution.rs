//! Agent execution result structures

use serde::{Deserialize, Serialize};

/// Result of agent execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Whether the execution was successful
    pub success: bool,

    /// Final answer, or the failure description
    pub final_result: String,

    /// Number of model calls made
    pub steps_executed: usize,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Number of tool calls executed
    pub tool_calls: usize,
}

impl AgentExecution {
    /// Create a successful execution result
    pub fn success(final_result: String, steps_executed: usize, duration_ms: u64) -> Self {
        Self {
            success: true,
            final_result,
            steps_executed,
            duration_ms,
            tool_calls: 0,
        }
    }

    /// Create a failed execution result
    pub fn failure(error: String, steps_executed: usize, duration_ms: u64) -> Self {
        Self {
            success: false,
            final_result: format!("Execution failed: {}", error),
            steps_executed,
            duration_ms,
            tool_calls: 0,
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: usize) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}
