use serde::{Deserialize, Serialize};

use super::RecordId;

/// A species record as stored by the managed backend or served by the local API.
///
/// The scientific name is the unique key within a dataset. Field names follow
/// the managed backend's snake_case schema; the aliases accept the camelCase
/// shape the local API emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(alias = "scientificName")]
    pub scientific_name: String,
    #[serde(default, alias = "commonName")]
    pub common_name: Option<String>,
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
    /// Specific epithet (second half of the binomial).
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    /// Water temperature at the occurrence, in degrees Celsius.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub habitat: Option<String>,
    #[serde(default, alias = "conservationStatus")]
    pub conservation_status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "dataSource")]
    pub data_source: Option<String>,
    /// Identifier of the record in the external OBIS registry.
    #[serde(default, alias = "obisId")]
    pub obis_id: Option<String>,
    /// WoRMS AphiaID, when the external registry reported one.
    #[serde(default, alias = "aphiaId")]
    pub aphia_id: Option<i64>,
}

impl Species {
    /// Case-insensitive substring match over the scientific and common names.
    pub fn name_contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.scientific_name.to_lowercase().contains(&needle)
            || self
                .common_name
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    }
}

/// Insert payload for a new species row. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpecies {
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub habitat: Option<String>,
    pub description: Option<String>,
    pub data_source: Option<String>,
    pub obis_id: Option<String>,
    pub aphia_id: Option<i64>,
}

impl NewSpecies {
    pub fn into_species(self, id: Option<RecordId>) -> Species {
        Species {
            id,
            scientific_name: self.scientific_name,
            common_name: self.common_name,
            kingdom: self.kingdom,
            phylum: self.phylum,
            class: self.class,
            order: self.order,
            family: self.family,
            genus: self.genus,
            species: self.species,
            latitude: self.latitude,
            longitude: self.longitude,
            depth: None,
            temperature: None,
            habitat: self.habitat,
            conservation_status: None,
            description: self.description,
            data_source: self.data_source,
            obis_id: self.obis_id,
            aphia_id: self.aphia_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_local_api_shape() {
        let raw = r#"{
            "id": "1",
            "scientificName": "Lutjanus campechanus",
            "commonName": "Red Snapper",
            "latitude": 22.5,
            "longitude": 91.8,
            "depth": 30,
            "temperature": 27.5,
            "conservationStatus": "Least Concern",
            "dataSource": "OBIS"
        }"#;
        let species: Species = serde_json::from_str(raw).unwrap();
        assert_eq!(species.scientific_name, "Lutjanus campechanus");
        assert_eq!(species.common_name.as_deref(), Some("Red Snapper"));
        assert_eq!(species.data_source.as_deref(), Some("OBIS"));
        assert_eq!(species.depth, Some(30.0));
        assert_eq!(species.temperature, Some(27.5));
    }

    #[test]
    fn name_match_is_case_insensitive_over_both_names() {
        let species: Species = serde_json::from_str(
            r#"{"scientific_name": "Tenualosa ilisha", "common_name": "Hilsa"}"#,
        )
        .unwrap();
        assert!(species.name_contains("ILISHA"));
        assert!(species.name_contains("hil"));
        assert!(!species.name_contains("snapper"));
    }
}
