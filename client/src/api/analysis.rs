use futures_util::FutureExt;

use matsya_common::model::analysis::{Analysis, AnalysisRequest, NewAnalysis};

use super::MatsyaClient;
use crate::error::{ClientResult, ValidationError};
use crate::fallback::Route;

impl MatsyaClient {
    /// Start an analysis. New analyses are `pending` at 0% progress.
    pub async fn create_analysis(&self, request: &AnalysisRequest) -> ClientResult<Analysis> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        if request.analysis_type.trim().is_empty() {
            return Err(ValidationError::MissingField("type").into());
        }
        let row = NewAnalysis::from(request.clone());
        let row = &row;
        self.plan()
            .execute("create_analysis", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => Ok(backend.insert_analysis(row).await?),
                        Route::Http => self.http.post_json("/analyses", row).await,
                    }
                }
                .boxed()
            })
            .await
    }

    pub async fn fetch_analyses(&self) -> ClientResult<Vec<Analysis>> {
        self.plan()
            .execute("fetch_analyses", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => Ok(backend.select_analyses().await?),
                        Route::Http => self
                            .http
                            .get_json::<Option<Vec<Analysis>>>("/analyses", &[])
                            .await
                            .map(Option::unwrap_or_default),
                    }
                }
                .boxed()
            })
            .await
    }
}
