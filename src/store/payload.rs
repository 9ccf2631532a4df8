//! Serialized payload text and its markup-safe encoding.
//!
//! The payload travels inside the generated document, so the rendered JSON
//! must not contain a byte sequence that could close the embedding block
//! (`</script>` being the classic one). `<` only occurs inside JSON strings,
//! where `\u003c` is an equivalent escape, so the whole text is rewritten
//! before it leaves the store.

use serde::{Deserialize, Serialize};

use crate::store::entry::TransferEntry;

pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PayloadDocument {
    schema_version: u32,
    entries: Vec<TransferEntry>,
}

/// Markup-safe textual encoding of a frozen transfer store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPayload(String);

/// Strict parse failure. [`crate::store::TransferStore::deserialize`]
/// recovers from this by substituting an empty store; the strict form exists
/// for bootstrap code that wants to log what was wrong.
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed transfer payload: {reason}")]
pub struct MalformedPayload {
    pub reason: String,
}

impl SerializedPayload {
    pub(crate) fn render(entries: Vec<TransferEntry>) -> Result<Self, serde_json::Error> {
        let doc = PayloadDocument {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            entries,
        };
        let json = serde_json::to_string(&doc)?;
        Ok(Self(escape_embedded(&json)))
    }

    /// Strictly parse payload text back into entries.
    pub fn parse(text: &str) -> Result<Vec<TransferEntry>, MalformedPayload> {
        let doc: PayloadDocument =
            serde_json::from_str(text).map_err(|e| MalformedPayload {
                reason: e.to_string(),
            })?;
        if doc.schema_version != PAYLOAD_SCHEMA_VERSION {
            return Err(MalformedPayload {
                reason: format!("unsupported schema version {}", doc.schema_version),
            });
        }
        Ok(doc.entries)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SerializedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape characters that could terminate the embedding block or break a
/// script-hosted parse. `<` and the JS line separators only occur inside
/// JSON strings, where the `\uXXXX` escapes are equivalent.
fn escape_embedded(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}
