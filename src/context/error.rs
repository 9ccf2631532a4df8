/// Configuration errors around the execution context lifecycle. These are
/// fatal to the cycle: proceeding with an unknown mode would reintroduce
/// duplicate fetches invisibly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContextError {
    /// The context was queried before the host installed it.
    #[error("execution context is not initialized; install it before any cache-aware call runs")]
    Uninitialized,

    /// A second installation within one cycle.
    #[error("execution context was already installed for this cycle")]
    AlreadyInitialized,

    /// Host bootstrap handed over an unrecognized mode string.
    #[error("unrecognized execution mode: {0:?}")]
    UnknownMode(String),
}
