use matsya_common::model::edna::EdnaMetadata;

use super::UploadFile;
use crate::error::ValidationError;

/// Largest accepted sequence file: 100 MB. A file of exactly this size passes.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "text/x-fasta",
    "application/x-fasta",
    "chemical/seq-na-fasta",
    "text/x-fastq",
    "application/x-fastq",
];

const ALLOWED_EXTENSIONS: &[&str] = &["fasta", "fa", "fna", "ffn", "faa", "fastq", "fq", "txt"];

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Check type and size of an upload before anything touches the network.
///
/// The type is accepted when either the extension or the reported MIME type is
/// on the allow-list; pickers frequently report no MIME type for `.fasta`.
pub fn validate_file(file: &UploadFile) -> Result<(), ValidationError> {
    let ext_ok = extension(&file.file_name)
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    let mime = file
        .content_type
        .as_deref()
        .map(|m| m.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();
    let mime_ok = ALLOWED_CONTENT_TYPES.contains(&mime.as_str());

    if !ext_ok && !mime_ok {
        return Err(ValidationError::UnsupportedFileType {
            file_name: file.file_name.clone(),
            content_type: if mime.is_empty() {
                "unknown".to_string()
            } else {
                mime
            },
        });
    }

    if file.size() == 0 {
        return Err(ValidationError::EmptyFile(file.file_name.clone()));
    }
    check_size(file.size())
}

pub fn check_size(size: u64) -> Result<(), ValidationError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

pub fn validate_metadata(metadata: &EdnaMetadata) -> Result<(), ValidationError> {
    if metadata.sample_id.trim().is_empty() {
        return Err(ValidationError::MissingField("sample_id"));
    }
    if metadata.location_name.trim().is_empty() {
        return Err(ValidationError::MissingField("location_name"));
    }
    if !(-90.0..=90.0).contains(&metadata.latitude) {
        return Err(ValidationError::InvalidField {
            field: "latitude",
            reason: format!("{} is outside [-90, 90]", metadata.latitude),
        });
    }
    if !(-180.0..=180.0).contains(&metadata.longitude) {
        return Err(ValidationError::InvalidField {
            field: "longitude",
            reason: format!("{} is outside [-180, 180]", metadata.longitude),
        });
    }
    if let Some(depth) = metadata.depth {
        if depth < 0.0 || !depth.is_finite() {
            return Err(ValidationError::InvalidField {
                field: "depth",
                reason: format!("{depth} is not a non-negative depth"),
            });
        }
    }
    Ok(())
}
