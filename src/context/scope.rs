use std::sync::{Arc, OnceLock};

use crate::context::error::ContextError;
use crate::context::mode::ExecutionMode;
use crate::status::StatusChannel;
use crate::store::TransferStore;

/// Request-scoped execution state: the mode, the transfer store, and (origin
/// only) the response status channel.
///
/// One context exists per document-generation cycle (origin) or
/// page-activation cycle (replay); it is discarded afterward and never shared
/// between unrelated requests. The mode is fixed at construction and never
/// changes mid-execution.
#[derive(Debug)]
pub struct ExecutionContext {
    mode: ExecutionMode,
    store: TransferStore,
    status: Option<StatusChannel>,
}

impl ExecutionContext {
    /// Context for the execution that renders the document.
    pub fn origin() -> Self {
        Self {
            mode: ExecutionMode::Origin,
            store: TransferStore::new(),
            status: Some(StatusChannel::new()),
        }
    }

    /// Context for the execution that consumes the document.
    ///
    /// `payload` is the transfer payload the bootstrap extracted from the
    /// document, if it found one. A missing or corrupt payload degrades to an
    /// empty store; replay then runs correctly, just without the
    /// optimization.
    pub fn replay(payload: Option<&str>) -> Self {
        let store = match payload {
            Some(text) => TransferStore::deserialize(text),
            None => {
                tracing::debug!("no transfer payload in document; replay starts with an empty store");
                TransferStore::empty_frozen()
            }
        };
        Self {
            mode: ExecutionMode::Replay,
            store,
            status: None,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn is_origin(&self) -> bool {
        self.mode.is_origin()
    }

    pub fn is_replay(&self) -> bool {
        self.mode.is_replay()
    }

    pub fn store(&self) -> &TransferStore {
        &self.store
    }

    /// Response status channel; present only on origin contexts.
    pub fn status(&self) -> Option<&StatusChannel> {
        self.status.as_ref()
    }
}

/// Set-once holder a host installs its per-cycle context into.
///
/// Components read the context through a cell the host hands them instead of
/// an ambient global, so nothing can leak between unrelated requests; a read
/// before installation fails fast instead of defaulting to a mode.
#[derive(Debug, Default)]
pub struct ContextCell {
    slot: OnceLock<Arc<ExecutionContext>>,
}

impl ContextCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the cycle's context. Valid exactly once.
    pub fn install(&self, ctx: ExecutionContext) -> Result<Arc<ExecutionContext>, ContextError> {
        let ctx = Arc::new(ctx);
        self.slot
            .set(ctx.clone())
            .map_err(|_| ContextError::AlreadyInitialized)?;
        Ok(ctx)
    }

    /// The installed context, or `Uninitialized` when queried too early.
    pub fn current(&self) -> Result<Arc<ExecutionContext>, ContextError> {
        self.slot.get().cloned().ok_or(ContextError::Uninitialized)
    }

    /// Shorthand for `current()?.mode()`.
    pub fn current_mode(&self) -> Result<ExecutionMode, ContextError> {
        Ok(self.current()?.mode())
    }
}
