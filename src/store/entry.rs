use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::CacheKey;

/// Whether an entry holds a single terminal value or an ordered sequence
/// observed over time. Determines replay behavior: deliver once vs. deliver
/// the sequence before (optionally) continuing live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    Many,
}

impl Multiplicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplicity::One => "one",
            Multiplicity::Many => "many",
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded result of one logical call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "multiplicity", rename_all = "snake_case")]
pub enum RecordedValue {
    One { value: Value },
    Many { values: Vec<Value> },
}

impl RecordedValue {
    pub fn multiplicity(&self) -> Multiplicity {
        match self {
            RecordedValue::One { .. } => Multiplicity::One,
            RecordedValue::Many { .. } => Multiplicity::Many,
        }
    }
}

/// One key's recorded result, as transferred between executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub key: CacheKey,
    #[serde(flatten)]
    pub recorded: RecordedValue,
}

impl TransferEntry {
    pub fn multiplicity(&self) -> Multiplicity {
        self.recorded.multiplicity()
    }

    /// The value of a `One` entry.
    pub fn single_value(&self) -> Option<&Value> {
        match &self.recorded {
            RecordedValue::One { value } => Some(value),
            RecordedValue::Many { .. } => None,
        }
    }

    /// The ordered values of a `Many` entry.
    pub fn sequence(&self) -> Option<&[Value]> {
        match &self.recorded {
            RecordedValue::Many { values } => Some(values),
            RecordedValue::One { .. } => None,
        }
    }
}
