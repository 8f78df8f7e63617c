use log::info;
use reqwest::multipart::{Form, Part};

use matsya_common::model::classification::ClassificationResult;

use super::MatsyaClient;
use crate::edna::UploadFile;
use crate::error::{ClientResult, ValidationError};

impl MatsyaClient {
    /// Send one image to `POST /classify`.
    ///
    /// There is no managed equivalent, so failures are returned directly.
    pub async fn classify_image(&self, image: &UploadFile) -> ClientResult<ClassificationResult> {
        if image.content.is_empty() {
            return Err(ValidationError::EmptyFile(image.file_name.clone()).into());
        }
        let part = Part::bytes(image.content.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.effective_content_type())?;
        let result: ClassificationResult = self
            .http
            .post_multipart("/classify", Form::new().part("file", part))
            .await?;
        info!(
            "Classified {}: {} ({:.2})",
            image.file_name, result.top_prediction.0, result.confidence
        );
        Ok(result)
    }
}
