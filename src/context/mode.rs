use serde::{Deserialize, Serialize};

use crate::context::error::ContextError;

/// Which of the two executions is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Produces the authoritative document and populates the transfer store.
    Origin,
    /// Consumes the document and the transfer store to resume interactivity.
    Replay,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Origin => "origin",
            ExecutionMode::Replay => "replay",
        }
    }

    /// Parse a mode string from host bootstrap configuration. Unknown strings
    /// are a configuration error, never a silent default.
    pub fn parse(s: &str) -> Result<Self, ContextError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "origin" => Ok(ExecutionMode::Origin),
            "replay" => Ok(ExecutionMode::Replay),
            other => Err(ContextError::UnknownMode(other.to_string())),
        }
    }

    pub fn is_origin(&self) -> bool {
        matches!(self, ExecutionMode::Origin)
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, ExecutionMode::Replay)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
