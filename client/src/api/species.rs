use futures_util::FutureExt;

use matsya_common::model::species::Species;
use matsya_common::requests::SpeciesQuery;

use super::MatsyaClient;
use crate::error::ClientResult;
use crate::fallback::Route;

impl MatsyaClient {
    /// List species, optionally filtered by a case-insensitive name substring.
    ///
    /// The filter is re-applied to whatever a route returns, so every record
    /// in the result matches `query` regardless of how the server filtered.
    /// An empty table yields an empty list.
    pub async fn fetch_species(&self, query: &SpeciesQuery) -> ClientResult<Vec<Species>> {
        let rows = self
            .plan()
            .execute("fetch_species", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => Ok(backend.select_species(query).await?),
                        Route::Http => {
                            self.http
                                .get_json::<Option<Vec<Species>>>("/species", &query.query_pairs())
                                .await
                                .map(Option::unwrap_or_default)
                        }
                    }
                }
                .boxed()
            })
            .await?;
        Ok(rows.into_iter().filter(|s| query.matches(s)).collect())
    }

    /// One species by id; `None` when it does not exist.
    pub async fn get_species(&self, id: &str) -> ClientResult<Option<Species>> {
        self.plan()
            .execute("get_species", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => Ok(backend.species_by_id(id).await?),
                        Route::Http => self.http.get_optional(&format!("/species/{id}")).await,
                    }
                }
                .boxed()
            })
            .await
    }
}
