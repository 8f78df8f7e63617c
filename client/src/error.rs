//! Error types for the data layer.

use reqwest::StatusCode;
use thiserror::Error;

use crate::backend::BackendError;

/// Caller misuse detected before any network call. Never retried and never
/// swallowed by the fallback chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file type: {file_name} ({content_type})")]
    UnsupportedFileType {
        file_name: String,
        content_type: String,
    },

    #[error("file too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("file is empty: {0}")]
    EmptyFile(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("managed backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("external registry error: {0}")]
    Registry(String),

    /// The blob was written but the metadata row could not be inserted.
    /// The blob is left in place.
    #[error("metadata insert failed after storing {blob_path}: {source}")]
    PartialUpload {
        blob_path: String,
        #[source]
        source: BackendError,
    },

    /// A registry sync failed after some rows were already inserted through
    /// the managed backend. Those rows stay.
    #[error("OBIS sync stopped after inserting {inserted} species: {source}")]
    PartialSync {
        inserted: u32,
        #[source]
        source: Box<ClientError>,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("cannot derive a websocket URL from scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether a failure on an optional route lets the chain try the next one.
    ///
    /// Validation errors and partially applied writes surface immediately.
    pub fn is_fallback_eligible(&self) -> bool {
        !matches!(
            self,
            ClientError::Validation(_)
                | ClientError::PartialUpload { .. }
                | ClientError::PartialSync { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
