//! Transfer store: the ordered, write-once mapping that carries recorded
//! results from the origin execution to the replay execution.
//!
//! The store lives exactly one document round trip: built incrementally while
//! the origin execution renders, frozen and serialized into the outgoing
//! document, rebuilt (read-only) when the replay execution boots.

pub mod entry;
pub mod error;
pub mod payload;
pub mod transfer;

pub use entry::{Multiplicity, RecordedValue, TransferEntry};
pub use error::StoreError;
pub use payload::{MalformedPayload, SerializedPayload, PAYLOAD_SCHEMA_VERSION};
pub use transfer::{StreamRecorder, TransferStore, Truncation, ValueSlot};
