use serde::{Deserialize, Serialize};
use std::fmt;

pub mod analysis;
pub mod classification;
pub mod edna;
pub mod obis;
pub mod species;

/// Primary key of a stored row.
///
/// The managed backend hands out numeric keys for some tables and UUID strings
/// for others, and the local API serialises its ids as strings, so both shapes
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}
