use crate::adapter::producer::ProducerError;
use crate::key::CacheKey;
use crate::store::{Multiplicity, StoreError};

/// Error type for cache-aware producer calls.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The wrapped producer failed; forwarded unmodified.
    #[error(transparent)]
    Producer(#[from] ProducerError),

    /// The transfer store rejected a write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The recorded entry does not match the multiplicity of this call —
    /// the key was registered through the other call shape.
    #[error("entry for key {key} is {found} but this call expects {expected}")]
    MultiplicityMismatch {
        key: CacheKey,
        expected: Multiplicity,
        found: Multiplicity,
    },

    /// A recorded value no longer decodes as the requested type.
    #[error("cannot decode recorded value for key {key}: {reason}")]
    Decode { key: CacheKey, reason: String },

    /// The producer completed without emitting the value a snapshot call
    /// needs.
    #[error("producer completed without emitting a value")]
    EmptyProducer,
}
