pub mod encode;

use serde::{Deserialize, Serialize};

pub use encode::canonical_json;

/// Deterministic identifier tying an origin-side write to the replay-side
/// read for the same logical call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already-derived key (e.g. one read back from a payload).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for key derivation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyError {
    /// Params have no JSON encoding (e.g. a map with non-string keys).
    #[error("cannot encode params for namespace {namespace}: {reason}")]
    Encoding { namespace: String, reason: String },
}

/// Derive the cache key for one logical call.
///
/// The namespace is length-prefixed so a namespace containing the separator
/// cannot alias a different namespace/param split, and params are canonically
/// encoded so both executions produce byte-identical keys regardless of field
/// ordering in the caller's types.
pub fn derive_key<P: Serialize>(namespace: &str, params: &P) -> Result<CacheKey, KeyError> {
    let value = serde_json::to_value(params).map_err(|e| KeyError::Encoding {
        namespace: namespace.to_string(),
        reason: e.to_string(),
    })?;
    Ok(CacheKey(format!(
        "{}:{}:{}",
        namespace.len(),
        namespace,
        canonical_json(&value)
    )))
}
