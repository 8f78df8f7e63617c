//! REST implementation of [`ManagedBackend`] for a hosted Supabase project.
//!
//! Table access goes through the PostgREST surface under `rest/v1/` and blob
//! writes through `storage/v1/object/`. Every request carries the project's
//! public key as `apikey`; the bearer is the current session's access token,
//! or the public key when no session is held.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;

use matsya_common::model::analysis::{Analysis, NewAnalysis};
use matsya_common::model::edna::{EdnaSample, NewEdnaSample};
use matsya_common::model::species::{NewSpecies, Species};
use matsya_common::requests::{EdnaSampleQuery, SpeciesQuery};

use super::{BackendError, BackendResult, BlobRef, ManagedBackend, Session};

const SPECIES: &str = "species";
const EDNA_SAMPLES: &str = "edna_samples";
const ANALYSES: &str = "analyses";

pub struct SupabaseBackend {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    bucket: String,
    session: watch::Sender<Option<Session>>,
}

#[derive(Deserialize)]
struct StorageUploadResponse {
    #[serde(rename = "Key", default)]
    key: Option<String>,
}

impl SupabaseBackend {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        bucket: &str,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let (session, _) = watch::channel(None);
        Ok(Self {
            http,
            base_url,
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            session,
        })
    }

    /// Replace the held session and notify auth-change subscribers.
    pub fn set_session(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }

    fn table_url(&self, table: &str) -> BackendResult<Url> {
        Ok(self.base_url.join(&format!("rest/v1/{table}"))?)
    }

    fn object_url(&self, prefix: &str, path: &str) -> BackendResult<Url> {
        let mut url = self.base_url.join(prefix)?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Storage("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(path.split('/'));
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> BackendResult<T> {
        let response = self.authorize(req).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn insert_one<T, B>(&self, table: &'static str, row: &B) -> BackendResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.table_url(table)?;
        let rows: Vec<T> = self
            .send_json(
                self.http
                    .post(url)
                    .header("Prefer", "return=representation")
                    .json(row),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::EmptyInsert(table))
    }
}

/// Quote a value for a PostgREST filter so commas and parentheses in user
/// input cannot split the `or=(...)` list.
fn quote_filter_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn push_window(url: &mut Url, limit: Option<u32>, offset: Option<u32>) {
    let mut pairs = url.query_pairs_mut();
    if let Some(limit) = limit {
        pairs.append_pair("limit", &limit.to_string());
    }
    if let Some(offset) = offset {
        pairs.append_pair("offset", &offset.to_string());
    }
}

#[async_trait]
impl ManagedBackend for SupabaseBackend {
    async fn select_species(&self, query: &SpeciesQuery) -> BackendResult<Vec<Species>> {
        let mut url = self.table_url(SPECIES)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "scientific_name.asc");
        if let Some(term) = query.search_term() {
            let pattern = quote_filter_value(&format!("*{term}*"));
            url.query_pairs_mut().append_pair(
                "or",
                &format!("(scientific_name.ilike.{pattern},common_name.ilike.{pattern})"),
            );
        }
        push_window(&mut url, query.limit, query.offset);
        let rows: Option<Vec<Species>> = self.send_json(self.http.get(url)).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn species_by_id(&self, id: &str) -> BackendResult<Option<Species>> {
        let mut url = self.table_url(SPECIES)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("limit", "1");
        let rows: Vec<Species> = self.send_json(self.http.get(url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn species_exists(&self, scientific_name: &str) -> BackendResult<bool> {
        let mut url = self.table_url(SPECIES)?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("scientific_name", &format!("eq.{scientific_name}"))
            .append_pair("limit", "1");
        let rows: Vec<Value> = self.send_json(self.http.get(url)).await?;
        Ok(!rows.is_empty())
    }

    async fn insert_species(&self, row: &NewSpecies) -> BackendResult<Species> {
        self.insert_one(SPECIES, row).await
    }

    async fn select_edna_samples(
        &self,
        query: &EdnaSampleQuery,
    ) -> BackendResult<Vec<EdnaSample>> {
        let mut url = self.table_url(EDNA_SAMPLES)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        if let Some(status) = query.status {
            url.query_pairs_mut()
                .append_pair("status", &format!("eq.{}", status.as_str()));
        }
        push_window(&mut url, query.limit, query.offset);
        let rows: Option<Vec<EdnaSample>> = self.send_json(self.http.get(url)).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn insert_edna_sample(&self, row: &NewEdnaSample) -> BackendResult<EdnaSample> {
        self.insert_one(EDNA_SAMPLES, row).await
    }

    async fn upload_blob(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> BackendResult<BlobRef> {
        let url = self.object_url("storage/v1/object/", path)?;
        let response: StorageUploadResponse = self
            .send_json(
                self.http
                    .post(url)
                    .header("content-type", content_type)
                    .header("x-upsert", "false")
                    .body(content),
            )
            .await?;

        let key = response.key.ok_or_else(|| {
            BackendError::Storage("storage response did not include an object key".to_string())
        })?;
        let bucket_prefix = format!("{}/", self.bucket);
        let stored_path = key
            .strip_prefix(&bucket_prefix)
            .unwrap_or(&key)
            .to_string();
        let public_url = self
            .object_url("storage/v1/object/public/", &stored_path)?
            .to_string();
        Ok(BlobRef {
            path: stored_path,
            public_url: Some(public_url),
        })
    }

    async fn insert_analysis(&self, row: &NewAnalysis) -> BackendResult<Analysis> {
        self.insert_one(ANALYSES, row).await
    }

    async fn select_analyses(&self) -> BackendResult<Vec<Analysis>> {
        let mut url = self.table_url(ANALYSES)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let rows: Option<Vec<Analysis>> = self.send_json(self.http.get(url)).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn current_session(&self) -> BackendResult<Option<Session>> {
        Ok(self.session.borrow().clone())
    }

    fn auth_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
