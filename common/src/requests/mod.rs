//! Query parameters accepted by the list endpoints.

use serde::{Deserialize, Serialize};

use crate::model::edna::EdnaStatus;
use crate::model::species::Species;

/// Filter for `GET /species`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesQuery {
    /// Case-insensitive substring over scientific and common name.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SpeciesQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// The term exactly as given. Only the empty string means "no filter";
    /// surrounding whitespace is part of the term.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches(&self, species: &Species) -> bool {
        self.search_term()
            .map_or(true, |term| species.name_contains(term))
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(term) = self.search_term() {
            pairs.push(("search", term.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// Filter for `GET /edna-samples`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdnaSampleQuery {
    pub status: Option<EdnaStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl EdnaSampleQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(scientific: &str, common: Option<&str>) -> Species {
        serde_json::from_value(serde_json::json!({
            "scientific_name": scientific,
            "common_name": common,
        }))
        .unwrap()
    }

    #[test]
    fn empty_search_is_no_filter() {
        let query = SpeciesQuery::search("");
        assert_eq!(query.search_term(), None);
        assert!(query.query_pairs().is_empty());
        assert!(query.matches(&species("Lates calcarifer", Some("Barramundi"))));
    }

    #[test]
    fn whitespace_is_part_of_the_term() {
        let barramundi = species("Lates calcarifer", Some("Barramundi"));
        assert!(!SpeciesQuery::search("   ").matches(&barramundi));
        assert_eq!(SpeciesQuery::search("   ").search_term(), Some("   "));

        let snapper = species("Snapperus testus", None);
        assert!(!SpeciesQuery::search(" snapper").matches(&snapper));
        assert!(SpeciesQuery::search("us t").matches(&snapper));
        assert_eq!(
            SpeciesQuery::search(" snapper").query_pairs(),
            vec![("search", " snapper".to_string())]
        );
    }

    #[test]
    fn pairs_carry_pagination_window() {
        let query = SpeciesQuery {
            search: Some("snapper".into()),
            limit: Some(20),
            offset: Some(40),
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("search", "snapper".to_string()),
                ("limit", "20".to_string()),
                ("offset", "40".to_string()),
            ]
        );
    }
}
