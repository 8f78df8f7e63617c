//! Environmental DNA sample records.
//!
//! A sample is created by an upload: the client validates the sequence file,
//! scans it for lightweight statistics, stores the file as a blob and finally
//! inserts an `EdnaSample` row pointing at that blob.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::RecordId;

/// Processing state of an uploaded sample.
///
/// `Uploaded` is only ever written once both the blob and the metadata row
/// exist. Later transitions happen server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdnaStatus {
    Uploaded,
    Processing,
    Processed,
    Failed,
}

impl EdnaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdnaStatus::Uploaded => "uploaded",
            EdnaStatus::Processing => "processing",
            EdnaStatus::Processed => "processed",
            EdnaStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EdnaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequence file format, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Fasta,
    Fastq,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Fasta => "fasta",
            FileFormat::Fastq => "fastq",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics computed client-side from the file content before persisting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequenceStats {
    pub file_format: FileFormat,
    pub sequence_count: u64,
    pub avg_sequence_length: f64,
}

/// Caller-supplied metadata for a new sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdnaMetadata {
    pub sample_id: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub collection_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
}

/// A stored eDNA sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdnaSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub sample_id: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub collection_date: NaiveDate,
    #[serde(default)]
    pub depth: Option<f64>,
    pub status: EdnaStatus,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_format: FileFormat,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_md5: Option<String>,
    #[serde(default)]
    pub sequence_count: u64,
    #[serde(default)]
    pub avg_sequence_length: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a sample row.
///
/// Built only after the blob write has returned, from that write's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdnaSample {
    #[serde(flatten)]
    pub metadata: EdnaMetadata,
    pub status: EdnaStatus,
    pub file_path: String,
    pub file_url: Option<String>,
    pub file_size: u64,
    pub file_md5: String,
    #[serde(flatten)]
    pub stats: SequenceStats,
}

impl NewEdnaSample {
    pub fn into_sample(self, id: Option<RecordId>) -> EdnaSample {
        EdnaSample {
            id,
            sample_id: self.metadata.sample_id,
            location_name: self.metadata.location_name,
            latitude: self.metadata.latitude,
            longitude: self.metadata.longitude,
            collection_date: self.metadata.collection_date,
            depth: self.metadata.depth,
            status: self.status,
            file_path: Some(self.file_path),
            file_url: self.file_url,
            file_format: self.stats.file_format,
            file_size: self.file_size,
            file_md5: Some(self.file_md5),
            sequence_count: self.stats.sequence_count,
            avg_sequence_length: self.stats.avg_sequence_length,
            created_at: None,
        }
    }
}
