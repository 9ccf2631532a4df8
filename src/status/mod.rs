//! Response status side channel for the origin cycle.
//!
//! Origin logic may set a response status/metadata value once per
//! document-generation cycle (e.g. a not-found signal discovered while
//! rendering). The channel has no interaction with the transfer store, and
//! replay contexts do not carry one at all — the replay environment has no
//! response to write to.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Response status/metadata value for the outgoing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResponseStatus {
    pub fn new(code: u16) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error type for the status side channel.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatusError {
    /// The status was already written earlier in this cycle.
    #[error("response status was already set for this cycle")]
    AlreadySet,
}

/// Set-once holder for the cycle's response status.
#[derive(Debug, Default)]
pub struct StatusChannel {
    slot: OnceLock<ResponseStatus>,
}

impl StatusChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the response status. Valid once per cycle.
    pub fn set(&self, status: ResponseStatus) -> Result<(), StatusError> {
        self.slot.set(status).map_err(|_| StatusError::AlreadySet)
    }

    pub fn get(&self) -> Option<&ResponseStatus> {
        self.slot.get()
    }
}
