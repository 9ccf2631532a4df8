use crate::key::CacheKey;

/// Error type for transfer store writes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A second registration of a key that already has an entry or an
    /// in-flight reservation. The first value is retained; callers must
    /// deduplicate identical logical calls before reaching the store.
    #[error("duplicate cache key: {0}")]
    DuplicateKey(CacheKey),

    /// The value has no JSON encoding.
    #[error("cannot encode value for key {key}: {reason}")]
    Encoding { key: CacheKey, reason: String },

    /// Write attempted after the store was frozen by serialization.
    #[error("transfer store is frozen; writes after serialization are rejected")]
    Frozen,

    /// The accumulated entries could not be rendered into payload text.
    #[error("cannot render transfer payload: {reason}")]
    Payload { reason: String },
}
