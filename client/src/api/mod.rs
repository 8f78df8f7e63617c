//! Data access functions.
//!
//! `MatsyaClient` bundles the HTTP transport, the optional managed backend and
//! the OBIS registry client. Operations with a managed equivalent run through
//! a [`TransportPlan`]; the rest talk to the HTTP API directly.
//!
//! | operation | managed route | HTTP route |
//! |---|---|---|
//! | [`fetch_species`](MatsyaClient::fetch_species) | `species` table | `GET /species` |
//! | [`get_species`](MatsyaClient::get_species) | `species` table | `GET /species/:id` |
//! | [`fetch_edna_samples`](MatsyaClient::fetch_edna_samples) | `edna_samples` table | `GET /edna-samples` |
//! | [`upload_edna_sample`](MatsyaClient::upload_edna_sample) | bucket + `edna_samples` | `POST /edna-samples` |
//! | [`sync_obis`](MatsyaClient::sync_obis) | OBIS API + `species` table | `POST /obis/sync` |
//! | [`create_analysis`](MatsyaClient::create_analysis) | `analyses` table | `POST /analyses` |
//! | [`fetch_analyses`](MatsyaClient::fetch_analyses) | `analyses` table | `GET /analyses` |
//! | [`classify_image`](MatsyaClient::classify_image) | none | `POST /classify` |
//! | [`health`](MatsyaClient::health) | none | `GET /health` |

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::auth::AuthContext;
use crate::backend::{ManagedBackend, SupabaseBackend};
use crate::config::ClientConfig;
use crate::credentials;
use crate::error::ClientResult;
use crate::fallback::TransportPlan;
use crate::obis::ObisClient;
use crate::transport::HttpTransport;

mod analysis;
mod classify;
mod edna;
mod obis;
mod species;

pub use edna::blob_path;

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Clone)]
pub struct MatsyaClient {
    http: HttpTransport,
    backend: Option<Arc<dyn ManagedBackend>>,
    use_backend: bool,
    obis: ObisClient,
}

impl MatsyaClient {
    /// Assemble a client from its parts.
    ///
    /// `backend` is attempted only when `use_backend` is also true; a
    /// configured but disabled backend is never called.
    pub fn new(
        http: HttpTransport,
        backend: Option<Arc<dyn ManagedBackend>>,
        use_backend: bool,
        obis: ObisClient,
    ) -> Self {
        Self {
            http,
            backend,
            use_backend,
            obis,
        }
    }

    /// Build every transport from configuration.
    ///
    /// A [`SupabaseBackend`] is created when both its URL and key are set.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let auth = AuthContext::new();
        let http = HttpTransport::new(&config.api_url, config.timeout(), auth)?;
        let backend = match config.supabase_credentials() {
            Some((url, key)) => {
                let backend =
                    SupabaseBackend::new(url, key, &config.edna_bucket, config.timeout())?;
                Some(Arc::new(backend) as Arc<dyn ManagedBackend>)
            }
            None => None,
        };
        let obis = ObisClient::new(&config.obis_url, config.timeout())?;
        info!(
            "Data client ready: api={} managed_backend={} enabled={}",
            config.api_url,
            backend.is_some(),
            config.use_supabase
        );
        Ok(Self::new(http, backend, config.use_supabase, obis))
    }

    pub fn auth(&self) -> &AuthContext {
        self.http.auth()
    }

    /// Set or clear the bearer token used by every subsequent HTTP call.
    pub fn set_auth_token(&self, token: Option<String>) {
        self.http.auth().set_token(token);
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.http
    }

    pub fn backend(&self) -> Option<&Arc<dyn ManagedBackend>> {
        self.backend.as_ref()
    }

    /// Follow the managed backend's session in the background.
    /// Returns `None` when no backend is configured.
    pub fn start_credential_sync(&self) -> Option<JoinHandle<()>> {
        credentials::spawn(self.backend.clone(), self.auth().clone())
    }

    fn plan(&self) -> TransportPlan<'_> {
        match &self.backend {
            Some(backend) if self.use_backend => TransportPlan::new(Some(backend.as_ref())),
            _ => TransportPlan::http_only(),
        }
    }

    pub async fn health(&self) -> ClientResult<Health> {
        self.http.get_json("/health", &[]).await
    }
}
