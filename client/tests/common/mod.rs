//! Shared test doubles and builders.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use matsya_client::auth::AuthContext;
use matsya_client::backend::{BackendError, BackendResult, BlobRef, ManagedBackend, Session};
use matsya_client::obis::ObisClient;
use matsya_client::transport::HttpTransport;
use matsya_client::MatsyaClient;
use matsya_common::model::analysis::{Analysis, NewAnalysis};
use matsya_common::model::edna::{EdnaSample, NewEdnaSample};
use matsya_common::model::species::{NewSpecies, Species};
use matsya_common::model::RecordId;
use matsya_common::requests::{EdnaSampleQuery, SpeciesQuery};

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Prefix the in-memory store puts in front of every requested blob path,
/// standing in for a storage service that decides the final key itself.
pub const STORED_PREFIX: &str = "stored/";

/// In-memory managed backend with call counting and failure switches.
pub struct MemoryBackend {
    pub species: Mutex<Vec<Species>>,
    pub samples: Mutex<Vec<EdnaSample>>,
    pub analyses: Mutex<Vec<Analysis>>,
    /// `(path, content, content_type)` for every stored blob.
    pub blobs: Mutex<Vec<(String, Vec<u8>, String)>>,
    calls: AtomicUsize,
    fail_all: AtomicBool,
    fail_sample_insert: AtomicBool,
    fail_session: AtomicBool,
    species_insert_limit: AtomicUsize,
    session: watch::Sender<Option<Session>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        let (session, _) = watch::channel(None);
        Arc::new(Self {
            species: Mutex::new(Vec::new()),
            samples: Mutex::new(Vec::new()),
            analyses: Mutex::new(Vec::new()),
            blobs: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_all: AtomicBool::new(false),
            fail_sample_insert: AtomicBool::new(false),
            fail_session: AtomicBool::new(false),
            species_insert_limit: AtomicUsize::new(usize::MAX),
            session,
        })
    }

    pub fn with_species(names: &[(&str, Option<&str>)]) -> Arc<Self> {
        let backend = Self::new();
        for (scientific, common) in names {
            let mut row = species_row(scientific);
            row.common_name = common.map(str::to_string);
            backend.species.lock().push(row);
        }
        backend
    }

    /// Total calls of any kind made against this backend.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sample_insert(&self, fail: bool) {
        self.fail_sample_insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_session(&self, fail: bool) {
        self.fail_session.store(fail, Ordering::SeqCst);
    }

    /// Reject species inserts once the table holds `limit` rows.
    pub fn fail_species_inserts_after(&self, limit: usize) {
        self.species_insert_limit.store(limit, Ordering::SeqCst);
    }

    pub fn set_session(&self, token: Option<&str>) {
        self.session.send_replace(token.map(|t| Session {
            access_token: t.to_string(),
            refresh_token: None,
            expires_at: None,
            user_id: Some("user-1".to_string()),
        }));
    }

    fn enter(&self) -> BackendResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BackendError::Http {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

pub fn species_row(scientific_name: &str) -> Species {
    NewSpecies {
        scientific_name: scientific_name.to_string(),
        common_name: None,
        kingdom: None,
        phylum: None,
        class: None,
        order: None,
        family: None,
        genus: None,
        species: None,
        latitude: None,
        longitude: None,
        habitat: None,
        description: None,
        data_source: None,
        obis_id: None,
        aphia_id: None,
    }
    .into_species(None)
}

#[async_trait]
impl ManagedBackend for MemoryBackend {
    async fn select_species(&self, query: &SpeciesQuery) -> BackendResult<Vec<Species>> {
        self.enter()?;
        let rows = self.species.lock();
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn species_by_id(&self, id: &str) -> BackendResult<Option<Species>> {
        self.enter()?;
        Ok(self
            .species
            .lock()
            .iter()
            .find(|s| s.id.as_ref().is_some_and(|rid| rid.to_string() == id))
            .cloned())
    }

    async fn species_exists(&self, scientific_name: &str) -> BackendResult<bool> {
        self.enter()?;
        Ok(self
            .species
            .lock()
            .iter()
            .any(|s| s.scientific_name == scientific_name))
    }

    async fn insert_species(&self, row: &NewSpecies) -> BackendResult<Species> {
        self.enter()?;
        let mut rows = self.species.lock();
        if rows.len() >= self.species_insert_limit.load(Ordering::SeqCst) {
            return Err(BackendError::Http {
                status: 503,
                body: "species table unavailable".to_string(),
            });
        }
        let species = row
            .clone()
            .into_species(Some(RecordId::Number(rows.len() as i64 + 1)));
        rows.push(species.clone());
        Ok(species)
    }

    async fn select_edna_samples(&self, query: &EdnaSampleQuery) -> BackendResult<Vec<EdnaSample>> {
        self.enter()?;
        Ok(self
            .samples
            .lock()
            .iter()
            .filter(|s| query.status.map_or(true, |status| s.status == status))
            .cloned()
            .collect())
    }

    async fn insert_edna_sample(&self, row: &NewEdnaSample) -> BackendResult<EdnaSample> {
        self.enter()?;
        if self.fail_sample_insert.load(Ordering::SeqCst) {
            return Err(BackendError::Http {
                status: 409,
                body: "duplicate sample_id".to_string(),
            });
        }
        let mut rows = self.samples.lock();
        let sample = row
            .clone()
            .into_sample(Some(RecordId::Number(rows.len() as i64 + 1)));
        rows.push(sample.clone());
        Ok(sample)
    }

    async fn upload_blob(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> BackendResult<BlobRef> {
        self.enter()?;
        let stored = format!("{STORED_PREFIX}{path}");
        self.blobs
            .lock()
            .push((stored.clone(), content, content_type.to_string()));
        Ok(BlobRef {
            public_url: Some(format!("https://blobs.test/{stored}")),
            path: stored,
        })
    }

    async fn insert_analysis(&self, row: &NewAnalysis) -> BackendResult<Analysis> {
        self.enter()?;
        let mut rows = self.analyses.lock();
        let analysis = row
            .clone()
            .into_analysis(Some(RecordId::Number(rows.len() as i64 + 1)));
        rows.push(analysis.clone());
        Ok(analysis)
    }

    async fn select_analyses(&self) -> BackendResult<Vec<Analysis>> {
        self.enter()?;
        Ok(self.analyses.lock().clone())
    }

    async fn current_session(&self) -> BackendResult<Option<Session>> {
        self.enter()?;
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("session store offline".to_string()));
        }
        Ok(self.session.borrow().clone())
    }

    fn auth_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

/// A client whose HTTP API lives at `{server}/api` and OBIS at `{server}/obis`.
pub fn client(
    server_url: &str,
    backend: Option<Arc<MemoryBackend>>,
    use_backend: bool,
) -> MatsyaClient {
    let http = HttpTransport::new(
        &format!("{server_url}/api"),
        Duration::from_secs(5),
        AuthContext::new(),
    )
    .unwrap();
    let obis = ObisClient::new(&format!("{server_url}/obis"), Duration::from_secs(5)).unwrap();
    let backend = backend.map(|b| b as Arc<dyn ManagedBackend>);
    MatsyaClient::new(http, backend, use_backend, obis)
}
