//! Client for the public OBIS occurrence API.

use log::debug;
use reqwest::Url;
use std::time::Duration;

use matsya_common::model::obis::{ObisOccurrence, ObisResponse};

use crate::error::{ClientError, ClientResult};

/// Species names pulled from OBIS on every registry sync.
pub const TARGET_SPECIES: &[&str] = &[
    "Tenualosa ilisha",
    "Lutjanus campechanus",
    "Scomberomorus commerson",
    "Pampus argenteus",
    "Harpadon nehereus",
    "Lates calcarifer",
    "Rastrelliger kanagurta",
    "Epinephelus coioides",
];

/// Occurrences requested per species name.
pub const OCCURRENCES_PER_SPECIES: u32 = 10;

const OCCURRENCE_FIELDS: &str = "id,scientificName,kingdom,phylum,class,order,family,genus,\
specificEpithet,decimalLatitude,decimalLongitude,depth,aphiaID";

#[derive(Clone)]
pub struct ObisClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ObisClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// Fetch up to `size` occurrence records for one scientific name.
    ///
    /// Every failure, including undecodable bodies, is reported as
    /// [`ClientError::Registry`].
    pub async fn occurrences(
        &self,
        scientific_name: &str,
        size: u32,
    ) -> ClientResult<Vec<ObisOccurrence>> {
        let mut url = self.base_url.join("occurrence")?;
        url.query_pairs_mut()
            .append_pair("scientificname", scientific_name)
            .append_pair("size", &size.to_string())
            .append_pair("fields", OCCURRENCE_FIELDS);

        debug!("Querying OBIS for {scientific_name}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Registry(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Registry(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Registry(format!("{status}: {body}")));
        }
        let parsed: ObisResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Registry(format!("unexpected response: {e}")))?;
        Ok(parsed.results)
    }
}
