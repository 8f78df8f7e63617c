//! Optional managed-backend transport.
//!
//! The managed backend is a hosted table store with blob storage and session
//! handling. It is an injected, optional dependency: `MatsyaClient` holds an
//! `Option<Arc<dyn ManagedBackend>>` resolved once at startup, so the
//! present/absent code paths are explicit and testable in isolation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use matsya_common::model::analysis::{Analysis, NewAnalysis};
use matsya_common::model::edna::{EdnaSample, NewEdnaSample};
use matsya_common::model::species::{NewSpecies, Species};
use matsya_common::requests::{EdnaSampleQuery, SpeciesQuery};

pub mod supabase;

pub use supabase::SupabaseBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("backend transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("insert into {0} returned no row")]
    EmptyInsert(&'static str),

    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// An authenticated session held by the managed backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Location of a stored blob, exactly as reported by the storage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub path: String,
    pub public_url: Option<String>,
}

#[async_trait]
pub trait ManagedBackend: Send + Sync {
    /// Rows of `species` matching the query window.
    async fn select_species(&self, query: &SpeciesQuery) -> BackendResult<Vec<Species>>;

    async fn species_by_id(&self, id: &str) -> BackendResult<Option<Species>>;

    /// Exact scientific-name lookup used for duplicate detection.
    async fn species_exists(&self, scientific_name: &str) -> BackendResult<bool>;

    async fn insert_species(&self, row: &NewSpecies) -> BackendResult<Species>;

    async fn select_edna_samples(&self, query: &EdnaSampleQuery)
        -> BackendResult<Vec<EdnaSample>>;

    async fn insert_edna_sample(&self, row: &NewEdnaSample) -> BackendResult<EdnaSample>;

    /// Store a file in the eDNA bucket and report where it landed.
    async fn upload_blob(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> BackendResult<BlobRef>;

    async fn insert_analysis(&self, row: &NewAnalysis) -> BackendResult<Analysis>;

    async fn select_analyses(&self) -> BackendResult<Vec<Analysis>>;

    async fn current_session(&self) -> BackendResult<Option<Session>>;

    /// Notifications of session changes (sign-in, refresh, sign-out).
    fn auth_changes(&self) -> watch::Receiver<Option<Session>>;
}
