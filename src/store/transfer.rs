use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::key::CacheKey;
use crate::store::entry::{RecordedValue, TransferEntry};
use crate::store::error::StoreError;
use crate::store::payload::SerializedPayload;

/// Policy for a stream recorder still open when the store is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truncation {
    /// Record the values observed so far as a partial sequence.
    #[default]
    KeepPartial,
    /// Discard the partial capture; the key stays unset and replay refetches.
    DropPartial,
}

#[derive(Debug)]
enum Pending {
    Snapshot,
    Stream {
        values: Vec<Value>,
        truncation: Truncation,
    },
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: IndexMap<CacheKey, RecordedValue>,
    pending: IndexMap<CacheKey, Pending>,
    frozen: bool,
    payload: Option<SerializedPayload>,
}

impl StoreInner {
    fn check_writable(&self, key: &CacheKey) -> Result<(), StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen);
        }
        if self.entries.contains_key(key) || self.pending.contains_key(key) {
            return Err(StoreError::DuplicateKey(key.clone()));
        }
        Ok(())
    }
}

/// Ordered mapping from cache keys to recorded results, built during one
/// origin execution and consumed by one replay execution.
///
/// The store has a single logical writer (the origin execution). The interior
/// mutex only makes the handle shareable with the spawned recording tasks; it
/// never arbitrates duplicate registrations — those fail with
/// [`StoreError::DuplicateKey`].
#[derive(Debug, Clone, Default)]
pub struct TransferStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl TransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single terminal value for `key`.
    pub fn set<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), StoreError> {
        let value = encode(&key, value)?;
        let mut inner = self.inner.lock();
        inner.check_writable(&key)?;
        inner.entries.insert(key, RecordedValue::One { value });
        Ok(())
    }

    /// Reserve `key` for an in-flight single-value call, so a concurrent
    /// registration of the same key fails fast instead of racing the first
    /// subscriber.
    pub fn reserve(&self, key: CacheKey) -> Result<ValueSlot, StoreError> {
        let mut inner = self.inner.lock();
        inner.check_writable(&key)?;
        inner.pending.insert(key.clone(), Pending::Snapshot);
        drop(inner);
        Ok(ValueSlot {
            key,
            store: self.clone(),
        })
    }

    /// Reserve `key` for a growing multi-value capture.
    pub fn begin_stream(
        &self,
        key: CacheKey,
        truncation: Truncation,
    ) -> Result<StreamRecorder, StoreError> {
        let mut inner = self.inner.lock();
        inner.check_writable(&key)?;
        inner.pending.insert(
            key.clone(),
            Pending::Stream {
                values: Vec::new(),
                truncation,
            },
        );
        drop(inner);
        Ok(StreamRecorder {
            key,
            store: self.clone(),
        })
    }

    /// Look up the recorded entry for `key`. A miss is a normal outcome, not
    /// an error. Usable in either mode (diagnostics during origin).
    pub fn get(&self, key: &CacheKey) -> Option<TransferEntry> {
        let inner = self.inner.lock();
        inner.entries.get(key).map(|recorded| TransferEntry {
            key: key.clone(),
            recorded: recorded.clone(),
        })
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.lock().frozen
    }

    /// All entries in origin insertion order.
    pub fn entries(&self) -> Vec<TransferEntry> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .map(|(key, recorded)| TransferEntry {
                key: key.clone(),
                recorded: recorded.clone(),
            })
            .collect()
    }

    /// All keys in origin insertion order.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    /// Freeze the store and render the transfer payload.
    ///
    /// The first call finalizes still-open stream recorders per their
    /// truncation policy and drops unresolved single-value reservations (an
    /// aborted origin call is indistinguishable from a miss on the replay
    /// side). Repeated calls return the same payload; entries cannot be added
    /// in between because writes after the freeze are rejected.
    pub fn serialize(&self) -> Result<SerializedPayload, StoreError> {
        let mut inner = self.inner.lock();
        if let Some(payload) = &inner.payload {
            return Ok(payload.clone());
        }
        inner.frozen = true;

        let pending = std::mem::take(&mut inner.pending);
        for (key, open) in pending {
            match open {
                Pending::Snapshot => {
                    tracing::debug!(key = %key, "dropping unresolved snapshot reservation at serialization");
                }
                Pending::Stream { values, truncation } => match truncation {
                    Truncation::KeepPartial => {
                        inner.entries.insert(key, RecordedValue::Many { values });
                    }
                    Truncation::DropPartial => {
                        tracing::debug!(key = %key, "dropping partial stream capture at serialization");
                    }
                },
            }
        }

        let entries = inner
            .entries
            .iter()
            .map(|(key, recorded)| TransferEntry {
                key: key.clone(),
                recorded: recorded.clone(),
            })
            .collect();
        let payload = SerializedPayload::render(entries).map_err(|e| StoreError::Payload {
            reason: e.to_string(),
        })?;
        inner.payload = Some(payload.clone());
        Ok(payload)
    }

    /// Rebuild a store from payload text at replay startup.
    ///
    /// A malformed payload yields an empty store: replay still works, every
    /// lookup misses, and only the optimization is lost.
    pub fn deserialize(text: &str) -> Self {
        let entries = match SerializedPayload::parse(text) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed transfer payload");
                Vec::new()
            }
        };
        Self::from_entries(entries)
    }

    pub(crate) fn empty_frozen() -> Self {
        Self::from_entries(Vec::new())
    }

    fn from_entries(parsed: Vec<TransferEntry>) -> Self {
        let mut entries = IndexMap::new();
        for entry in parsed {
            if entries.contains_key(&entry.key) {
                tracing::warn!(key = %entry.key, "transfer payload repeats a key; keeping the first entry");
                continue;
            }
            entries.insert(entry.key, entry.recorded);
        }
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entries,
                pending: IndexMap::new(),
                frozen: true,
                payload: None,
            })),
        }
    }
}

fn encode<T: Serialize>(key: &CacheKey, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Encoding {
        key: key.clone(),
        reason: e.to_string(),
    })
}

/// Reservation for an in-flight single-value call.
#[derive(Debug)]
pub struct ValueSlot {
    key: CacheKey,
    store: TransferStore,
}

impl ValueSlot {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Resolve the reservation with the produced value.
    pub fn fill<T: Serialize>(self, value: &T) -> Result<(), StoreError> {
        let encoded = match encode(&self.key, value) {
            Ok(encoded) => encoded,
            Err(err) => {
                // Release the key so the failed call reads as a plain miss.
                self.abandon();
                return Err(err);
            }
        };
        let mut inner = self.store.inner.lock();
        if inner.frozen {
            return Err(StoreError::Frozen);
        }
        inner.pending.shift_remove(&self.key);
        inner
            .entries
            .insert(self.key, RecordedValue::One { value: encoded });
        Ok(())
    }

    /// Release the key without recording anything (producer failure or
    /// abandoned call); replay will treat it as a miss.
    pub fn abandon(self) {
        let mut inner = self.store.inner.lock();
        inner.pending.shift_remove(&self.key);
    }
}

/// Handle for appending a live stream's values into a growing `Many` entry.
#[derive(Debug)]
pub struct StreamRecorder {
    key: CacheKey,
    store: TransferStore,
}

impl StreamRecorder {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Append one observed value.
    pub fn push<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let encoded = encode(&self.key, value)?;
        let mut inner = self.store.inner.lock();
        if inner.frozen {
            return Err(StoreError::Frozen);
        }
        if let Some(Pending::Stream { values, .. }) = inner.pending.get_mut(&self.key) {
            values.push(encoded);
        }
        Ok(())
    }

    /// Finalize the recorded sequence into the store. A no-op when the freeze
    /// already finalized it at the document boundary.
    pub fn complete(self) {
        let mut inner = self.store.inner.lock();
        if inner.frozen {
            return;
        }
        if let Some(Pending::Stream { values, .. }) = inner.pending.shift_remove(&self.key) {
            inner.entries.insert(self.key, RecordedValue::Many { values });
        }
    }

    /// Discard the capture and release the key (producer failure); replay
    /// will treat it as a miss.
    pub fn abandon(self) {
        let mut inner = self.store.inner.lock();
        if inner.frozen {
            return;
        }
        inner.pending.shift_remove(&self.key);
    }
}
