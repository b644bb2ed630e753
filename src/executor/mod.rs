//! Topological execution of validated function graphs.

use serde::{Deserialize, Serialize};

mod context;
mod engine;

pub use context::ExecutionContext;
pub use engine::{Executor, execute};

/// Ordered console trace of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub console_output: Vec<String>,
    pub success: bool,
}

impl ExecutionResult {
    pub fn succeeded(console_output: Vec<String>) -> Self {
        Self {
            console_output,
            success: true,
        }
    }

    /// A failed run keeps no console lines; execution is all-or-nothing.
    pub fn failed() -> Self {
        Self {
            console_output: Vec::new(),
            success: false,
        }
    }
}
