use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::domain::RankedMatch;

/// Response for the rank endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    #[serde(rename = "providerId")]
    pub provider_id: String,
    pub matches: Vec<RankedMatch>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Normalized values; a field is present only if it was requested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(rename = "dataSource")]
    pub data_source: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
