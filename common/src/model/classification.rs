use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of the image classification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Normalised score per candidate species.
    pub predictions: BTreeMap<String, f64>,
    /// `(label, score)` of the best candidate.
    pub top_prediction: (String, f64),
    pub confidence: f64,
    /// Seconds spent server-side.
    pub processing_time: f64,
    #[serde(default)]
    pub filename: Option<String>,
}
