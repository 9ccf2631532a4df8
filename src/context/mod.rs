//! Execution context: which of the two executions is running, and the
//! request-scoped state that travels with it.

pub mod error;
pub mod mode;
pub mod scope;

pub use error::ContextError;
pub use mode::ExecutionMode;
pub use scope::{ContextCell, ExecutionContext};
