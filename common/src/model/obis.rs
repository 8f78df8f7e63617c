//! Wire types for the OBIS occurrence API and the registry sync result.

use serde::{Deserialize, Serialize};

use super::species::NewSpecies;

pub const OBIS_DATA_SOURCE: &str = "OBIS";

/// One occurrence record from `GET /occurrence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObisOccurrence {
    #[serde(default)]
    pub id: Option<String>,
    pub scientific_name: String,
    #[serde(default)]
    pub kingdom: Option<String>,
    #[serde(default)]
    pub phylum: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub specific_epithet: Option<String>,
    #[serde(default)]
    pub decimal_latitude: Option<f64>,
    #[serde(default)]
    pub decimal_longitude: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default, rename = "aphiaID")]
    pub aphia_id: Option<i64>,
}

impl ObisOccurrence {
    /// Derive the species row recorded for an occurrence not yet present locally.
    pub fn to_new_species(&self) -> NewSpecies {
        let habitat = match self.depth {
            Some(depth) => format!("Marine, depth: {depth}m"),
            None => "Marine".to_string(),
        };
        NewSpecies {
            scientific_name: self.scientific_name.clone(),
            common_name: None,
            kingdom: self.kingdom.clone(),
            phylum: self.phylum.clone(),
            class: self.class.clone(),
            order: self.order.clone(),
            family: self.family.clone(),
            genus: self.genus.clone(),
            species: self.specific_epithet.clone(),
            latitude: self.decimal_latitude,
            longitude: self.decimal_longitude,
            habitat: Some(habitat),
            description: Some(
                "Imported from OBIS (Ocean Biodiversity Information System)".to_string(),
            ),
            data_source: Some(OBIS_DATA_SOURCE.to_string()),
            obis_id: self.id.clone(),
            aphia_id: self.aphia_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObisResponse {
    #[serde(default)]
    pub results: Vec<ObisOccurrence>,
    #[serde(default)]
    pub total: u64,
}

/// Outcome of a registry sync: how many species rows were newly inserted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncResult {
    #[serde(default)]
    pub message: String,
    #[serde(alias = "synced")]
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_maps_depth_into_habitat() {
        let occ: ObisOccurrence = serde_json::from_str(
            r#"{
                "id": "occ-1",
                "scientificName": "Tenualosa ilisha",
                "family": "Clupeidae",
                "genus": "Tenualosa",
                "specificEpithet": "ilisha",
                "decimalLatitude": 21.8,
                "decimalLongitude": 89.9,
                "depth": 12.5,
                "aphiaID": 217460
            }"#,
        )
        .unwrap();
        let row = occ.to_new_species();
        assert_eq!(row.species.as_deref(), Some("ilisha"));
        assert_eq!(row.habitat.as_deref(), Some("Marine, depth: 12.5m"));
        assert_eq!(row.latitude, Some(21.8));
        assert_eq!(row.aphia_id, Some(217460));
        assert_eq!(row.data_source.as_deref(), Some(OBIS_DATA_SOURCE));
    }

    #[test]
    fn occurrence_without_depth_is_plain_marine() {
        let occ: ObisOccurrence =
            serde_json::from_str(r#"{"scientificName": "Lates calcarifer"}"#).unwrap();
        assert_eq!(occ.to_new_species().habitat.as_deref(), Some("Marine"));
    }

    #[test]
    fn sync_result_accepts_legacy_synced_key() {
        let result: SyncResult = serde_json::from_str(r#"{"synced": 4}"#).unwrap();
        assert_eq!(result.count, 4);
        assert!(result.message.is_empty());
    }
}
