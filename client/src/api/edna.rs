use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use log::info;
use reqwest::multipart::{Form, Part};

use matsya_common::model::edna::{
    EdnaMetadata, EdnaSample, EdnaStatus, NewEdnaSample, SequenceStats,
};
use matsya_common::requests::EdnaSampleQuery;

use super::MatsyaClient;
use crate::backend::ManagedBackend;
use crate::edna::{scan_sequences, validate_file, validate_metadata, UploadFile};
use crate::error::{ClientError, ClientResult};
use crate::fallback::Route;

/// Storage path for an uploaded file: `<sample_id>/<unix millis>_<file name>`.
pub fn blob_path(sample_id: &str, file_name: &str, at: DateTime<Utc>) -> String {
    let file_name = file_name.replace('/', "_");
    format!("{sample_id}/{}_{file_name}", at.timestamp_millis())
}

/// What the upload has already computed before choosing a route.
struct Prepared<'a> {
    file: &'a UploadFile,
    metadata: &'a EdnaMetadata,
    stats: SequenceStats,
    md5: String,
}

impl Prepared<'_> {
    fn row(&self, file_path: String, file_url: Option<String>) -> NewEdnaSample {
        NewEdnaSample {
            metadata: self.metadata.clone(),
            status: EdnaStatus::Uploaded,
            file_path,
            file_url,
            file_size: self.file.size(),
            file_md5: self.md5.clone(),
            stats: self.stats.clone(),
        }
    }

    fn form(&self) -> ClientResult<Form> {
        let file = Part::bytes(self.file.content.clone())
            .file_name(self.file.file_name.clone())
            .mime_str(&self.file.effective_content_type())?;
        let metadata = self.metadata;
        let mut form = Form::new()
            .part("file", file)
            .text("sample_id", metadata.sample_id.clone())
            .text("location_name", metadata.location_name.clone())
            .text("latitude", metadata.latitude.to_string())
            .text("longitude", metadata.longitude.to_string())
            .text("collection_date", metadata.collection_date.to_string());
        if let Some(depth) = metadata.depth {
            form = form.text("depth", depth.to_string());
        }
        Ok(form
            .text("file_format", self.stats.file_format.to_string())
            .text("sequence_count", self.stats.sequence_count.to_string())
            .text(
                "avg_sequence_length",
                self.stats.avg_sequence_length.to_string(),
            )
            .text("file_md5", self.md5.clone()))
    }
}

/// Blob first, then the row that points at it.
///
/// The row records exactly the path the storage write reported. A failed
/// blob write means no row is attempted; a failed row insert leaves the blob
/// where it is and is reported as [`ClientError::PartialUpload`].
async fn upload_via_backend(
    backend: &dyn ManagedBackend,
    prepared: &Prepared<'_>,
) -> ClientResult<EdnaSample> {
    let file = prepared.file;
    let path = blob_path(&prepared.metadata.sample_id, &file.file_name, Utc::now());
    let blob = backend
        .upload_blob(&path, file.content.clone(), &file.effective_content_type())
        .await?;
    let row = prepared.row(blob.path.clone(), blob.public_url.clone());
    backend
        .insert_edna_sample(&row)
        .await
        .map_err(|source| ClientError::PartialUpload {
            blob_path: blob.path,
            source,
        })
}

impl MatsyaClient {
    pub async fn fetch_edna_samples(&self, query: &EdnaSampleQuery) -> ClientResult<Vec<EdnaSample>> {
        self.plan()
            .execute("fetch_edna_samples", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => Ok(backend.select_edna_samples(query).await?),
                        Route::Http => self
                            .http
                            .get_json::<Option<Vec<EdnaSample>>>(
                                "/edna-samples",
                                &query.query_pairs(),
                            )
                            .await
                            .map(Option::unwrap_or_default),
                    }
                }
                .boxed()
            })
            .await
    }

    /// Validate, scan and store a sequence file with its sample metadata.
    ///
    /// Validation runs before any network call and its errors are returned
    /// as-is, whichever routes are configured.
    pub async fn upload_edna_sample(
        &self,
        file: &UploadFile,
        metadata: &EdnaMetadata,
    ) -> ClientResult<EdnaSample> {
        validate_file(file)?;
        validate_metadata(metadata)?;

        let prepared = Prepared {
            file,
            metadata,
            stats: scan_sequences(&file.file_name, &file.content),
            md5: file.md5_hex(),
        };
        info!(
            "Uploading {} for sample {} ({} bytes, {} {} sequences)",
            file.file_name,
            metadata.sample_id,
            file.size(),
            prepared.stats.sequence_count,
            prepared.stats.file_format
        );

        let prepared = &prepared;
        self.plan()
            .execute("upload_edna_sample", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => upload_via_backend(backend, prepared).await,
                        Route::Http => {
                            self.http
                                .post_multipart("/edna-samples", prepared.form()?)
                                .await
                        }
                    }
                }
                .boxed()
            })
            .await
    }
}
