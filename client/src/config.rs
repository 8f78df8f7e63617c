//! Client configuration, read from `MATSYA_*` environment variables.
//!
//! An optional `.env` file in the working directory is loaded first.

use config::{Config, Environment, Map};
use serde::Deserialize;
use std::time::Duration;

use crate::error::ClientResult;

pub const ENV_PREFIX: &str = "MATSYA";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the local REST API.
    pub api_url: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Gate for attempting the managed backend at all.
    pub use_supabase: bool,
    pub obis_url: String,
    pub timeout_secs: u64,
    /// Live events kept in memory per channel; 0 keeps everything.
    pub event_log_capacity: usize,
    pub edna_bucket: String,
}

impl ClientConfig {
    /// Load from the process environment (after `.env`).
    pub fn from_env() -> ClientResult<Self> {
        let _ = dotenvy::dotenv();
        Self::load(None)
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: Map<String, String>) -> ClientResult<Self> {
        Self::load(Some(vars))
    }

    fn load(source: Option<Map<String, String>>) -> ClientResult<Self> {
        let config = Config::builder()
            .set_default("api_url", "http://localhost:8000/api")?
            .set_default("use_supabase", false)?
            .set_default("obis_url", "https://api.obis.org")?
            .set_default("timeout_secs", 30)?
            .set_default("event_log_capacity", 500)?
            .set_default("edna_bucket", "edna-files")?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(source),
            )
            .build()?;
        let mut loaded: ClientConfig = config.try_deserialize()?;
        loaded.supabase_url = loaded.supabase_url.filter(|s| !s.trim().is_empty());
        loaded.supabase_anon_key = loaded.supabase_anon_key.filter(|s| !s.trim().is_empty());
        Ok(loaded)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// URL and key of the managed backend, when both are configured.
    pub fn supabase_credentials(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }

    pub fn event_log_capacity(&self) -> Option<usize> {
        (self.event_log_capacity > 0).then_some(self.event_log_capacity)
    }
}
