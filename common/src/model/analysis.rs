use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RecordId;

/// Lifecycle of an analysis run. Created `Pending`; advanced server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(rename = "type")]
    pub analysis_type: String,
    #[serde(default)]
    pub parameters: Value,
    pub status: AnalysisStatus,
    /// Percent complete, 0..=100.
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What a caller supplies to start an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub analysis_type: String,
    #[serde(default)]
    pub parameters: Value,
}

/// Insert payload: the request plus the initial client-side state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysis {
    #[serde(flatten)]
    pub request: AnalysisRequest,
    pub status: AnalysisStatus,
    pub progress: u32,
}

impl From<AnalysisRequest> for NewAnalysis {
    fn from(request: AnalysisRequest) -> Self {
        Self {
            request,
            status: AnalysisStatus::Pending,
            progress: 0,
        }
    }
}

impl NewAnalysis {
    pub fn into_analysis(self, id: Option<RecordId>) -> Analysis {
        Analysis {
            id,
            name: self.request.name,
            analysis_type: self.request.analysis_type,
            parameters: self.request.parameters,
            status: self.status,
            progress: self.progress,
            results: None,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_analysis_starts_pending_at_zero() {
        let new: NewAnalysis = AnalysisRequest {
            name: "Bay of Bengal diversity".into(),
            analysis_type: "biodiversity".into(),
            parameters: json!({"region": "BoB"}),
        }
        .into();
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["type"], "biodiversity");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["progress"], 0);
        assert_eq!(value["parameters"]["region"], "BoB");
    }
}
