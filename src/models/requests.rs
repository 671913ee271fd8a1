use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{PatientMatchInput, ProviderMatchInput};

/// Request to score one patient against one provider
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreRequest {
    #[validate(custom(function = "validate_patient"))]
    pub patient: PatientMatchInput,
    #[validate(custom(function = "validate_provider"))]
    pub provider: ProviderMatchInput,
}

/// Request to rank a set of waitlisted patients for a provider's slot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankRequest {
    #[validate(custom(function = "validate_provider"))]
    pub provider: ProviderMatchInput,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub patients: Vec<PatientMatchInput>,
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

/// Request to normalize free-text diagnosis and/or insurance values
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_normalize"))]
pub struct NormalizeRequest {
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub insurance: Option<String>,
}

/// Query string for ranking a stored slot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlotMatchesQuery {
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

fn validate_patient(patient: &PatientMatchInput) -> Result<(), validator::ValidationError> {
    if patient.id.trim().is_empty() {
        return Err(validator::ValidationError::new("empty_patient_id"));
    }
    Ok(())
}

fn validate_provider(provider: &ProviderMatchInput) -> Result<(), validator::ValidationError> {
    if provider.id.trim().is_empty() {
        return Err(validator::ValidationError::new("empty_provider_id"));
    }
    Ok(())
}

fn validate_normalize(req: &NormalizeRequest) -> Result<(), validator::ValidationError> {
    if req.diagnosis.is_none() && req.insurance.is_none() {
        return Err(validator::ValidationError::new("nothing_to_normalize"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_request_needs_a_field() {
        let empty = NormalizeRequest {
            diagnosis: None,
            insurance: None,
        };
        assert!(empty.validate().is_err());

        let ok = NormalizeRequest {
            diagnosis: Some("anxious".to_string()),
            insurance: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_rank_request_rejects_zero_limit_and_blank_provider() {
        let req: RankRequest = serde_json::from_str(
            r#"{"provider":{"id":" "},"patients":[],"limit":0}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("limit"));
        assert!(fields.contains_key("provider"));
    }
}
