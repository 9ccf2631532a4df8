pub mod adapter;
pub mod context;
pub mod key;
pub mod status;
pub mod store;

pub use adapter::{
    AdapterError, Continuation, MockConfig, MockProducer, Producer, ProducerError, ReplayStream,
    StreamOptions, Subscription, TransferAdapter,
};
pub use context::{ContextCell, ContextError, ExecutionContext, ExecutionMode};
pub use key::{derive_key, CacheKey, KeyError};
pub use status::{ResponseStatus, StatusChannel, StatusError};
pub use store::{
    MalformedPayload, Multiplicity, RecordedValue, SerializedPayload, StoreError, StreamRecorder,
    TransferEntry, TransferStore, Truncation, ValueSlot,
};
