//! Events pushed by the server over the live update socket.
//!
//! Frames are JSON text carrying a `type` discriminator. Parsing never fails:
//! a JSON object with an unrecognised `type` becomes [`LiveEvent::Other`] and
//! anything that is not JSON at all becomes [`LiveEvent::Raw`], so a malformed
//! frame stays visible instead of being dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Data domains a consumer may cache. Live events invalidate one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataDomain {
    Species,
    EdnaSamples,
    Analyses,
    Classifications,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    Connected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Welcome {
        #[serde(default)]
        message: String,
    },
    Echo {
        #[serde(default)]
        message: String,
    },
    ObisSync {
        count: u32,
    },
    EdnaUpload {
        sample_id: String,
    },
    Classification {
        #[serde(default)]
        result: Value,
    },
    /// A frame that was not JSON, kept verbatim.
    Raw {
        data: String,
    },
    /// Valid JSON whose `type` this client does not know.
    #[serde(skip)]
    Other {
        kind: Option<String>,
        payload: Value,
    },
}

impl LiveEvent {
    pub fn from_frame(text: &str) -> LiveEvent {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                return LiveEvent::Raw {
                    data: text.to_string(),
                }
            }
        };
        match serde_json::from_value::<LiveEvent>(value.clone()) {
            Ok(event) => event,
            Err(_) => LiveEvent::Other {
                kind: value
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                payload: value,
            },
        }
    }

    /// The `type` discriminator this event was received with.
    pub fn kind(&self) -> &str {
        match self {
            LiveEvent::Connected { .. } => "connected",
            LiveEvent::Welcome { .. } => "welcome",
            LiveEvent::Echo { .. } => "echo",
            LiveEvent::ObisSync { .. } => "obis_sync",
            LiveEvent::EdnaUpload { .. } => "edna_upload",
            LiveEvent::Classification { .. } => "classification",
            LiveEvent::Raw { .. } => "raw",
            LiveEvent::Other { kind, .. } => kind.as_deref().unwrap_or("unknown"),
        }
    }

    /// The cached data domain this event makes stale, if any.
    pub fn domain(&self) -> Option<DataDomain> {
        match self {
            LiveEvent::ObisSync { .. } => Some(DataDomain::Species),
            LiveEvent::EdnaUpload { .. } => Some(DataDomain::EdnaSamples),
            LiveEvent::Classification { .. } => Some(DataDomain::Classifications),
            _ => None,
        }
    }
}
