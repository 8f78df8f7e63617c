//! Client-side preparation of eDNA uploads: validation and sequence statistics.

use std::path::Path;

use crate::error::ClientResult;

pub mod stats;
pub mod validate;

pub use stats::scan_sequences;
pub use validate::{check_size, validate_file, validate_metadata, MAX_UPLOAD_BYTES};

/// A sequence file picked by the caller, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    /// MIME type as reported by the picker, if any.
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            content,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string());
        Ok(Self {
            file_name,
            content_type,
            content,
        })
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// MIME type sent with the file, falling back to a guess from the name.
    pub fn effective_content_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first_or_text_plain()
                    .essence_str()
                    .to_string()
            })
    }

    pub fn md5_hex(&self) -> String {
        format!("{:x}", md5::compute(&self.content))
    }
}
