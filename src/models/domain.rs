use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Score reported for a pair is never above this value, whatever the raw sum.
pub const MAX_REPORTED_SCORE: u32 = 100;

/// How an appointment is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "in-person", alias = "in_person", alias = "inperson", alias = "office")]
    InPerson,
    #[serde(rename = "virtual", alias = "telehealth", alias = "video")]
    Virtual,
}

/// Patient's modality preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalityPreference {
    #[serde(rename = "in-person", alias = "in_person", alias = "inperson", alias = "office")]
    InPerson,
    #[serde(rename = "virtual", alias = "telehealth", alias = "video")]
    Virtual,
    #[serde(rename = "either", alias = "both", alias = "any")]
    Either,
}

impl ModalityPreference {
    /// The concrete modality this preference asks for, `None` for `Either`
    pub fn modality(self) -> Option<Modality> {
        match self {
            ModalityPreference::InPerson => Some(Modality::InPerson),
            ModalityPreference::Virtual => Some(Modality::Virtual),
            ModalityPreference::Either => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenderPreference {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[default]
    #[serde(rename = "no-preference", alias = "no_preference", alias = "any", alias = "none")]
    NoPreference,
}

/// Matching-relevant view of a waitlisted patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientMatchInput {
    pub id: String,
    /// Condition labels, primary diagnosis first
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(rename = "insuranceProvider", alias = "insurance_provider", default)]
    pub insurance_provider: Option<String>,
    #[serde(rename = "preferredModality", alias = "preferred_modality", default)]
    pub preferred_modality: Option<ModalityPreference>,
    #[serde(rename = "preferredGender", alias = "preferred_gender", default)]
    pub preferred_gender: GenderPreference,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "handRaised", alias = "hand_raised", default)]
    pub hand_raised: bool,
    #[serde(rename = "joinedAt", alias = "joined_at", alias = "created_at", default)]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Matching-relevant view of a provider owning an open slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMatchInput {
    pub id: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(rename = "insuranceAccepted", alias = "insurance_accepted", default)]
    pub insurance_accepted: Vec<String>,
    #[serde(rename = "modalityOffered", alias = "modality_offered", default)]
    pub modality_offered: Vec<Modality>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Points each dimension contributed to a score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub diagnosis: u32,
    pub insurance: u32,
    pub location: u32,
    pub modality: u32,
    #[serde(rename = "handRaised")]
    pub hand_raised: u32,
}

impl DimensionBreakdown {
    /// Uncapped sum of all dimensions, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        self.diagnosis
            .saturating_add(self.insurance)
            .saturating_add(self.location)
            .saturating_add(self.modality)
            .saturating_add(self.hand_raised)
    }
}

/// Outcome of scoring one (patient, provider) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u32,
    #[serde(rename = "rawScore")]
    pub raw_score: u32,
    pub breakdown: DimensionBreakdown,
    #[serde(rename = "matchedConditions")]
    pub matched_conditions: Vec<String>,
    #[serde(rename = "genderPreferenceMet")]
    pub gender_preference_met: bool,
    #[serde(rename = "isMatch")]
    pub is_match: bool,
}

/// A match placed in waitlist order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub rank: usize,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "handRaised")]
    pub hand_raised: bool,
    #[serde(rename = "joinedAt")]
    pub joined_at: Option<DateTime<Utc>>,
    pub result: MatchResult,
}

/// Per-dimension points and the pass threshold
///
/// Defaults add up to 120; the reported score is capped at 100 so a raised
/// hand can lift a patient over the threshold without a perfect clinical fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub diagnosis: u32,
    pub insurance: u32,
    pub location: u32,
    pub modality: u32,
    #[serde(rename = "handRaised")]
    pub hand_raised: u32,
    pub threshold: u32,
}

impl MatchWeights {
    /// Reject thresholds outside the score range and weight tables whose
    /// total cannot be represented
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.threshold > MAX_REPORTED_SCORE {
            return Err(ConfigurationError::ThresholdOutOfRange(self.threshold as i64));
        }
        self.max_raw_score()
            .map(|_| ())
            .ok_or(ConfigurationError::WeightTotalOverflow)
    }

    /// Raw score of a pair that matches on every dimension
    pub fn max_raw_score(&self) -> Option<u32> {
        self.diagnosis
            .checked_add(self.insurance)?
            .checked_add(self.location)?
            .checked_add(self.modality)?
            .checked_add(self.hand_raised)
    }
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            diagnosis: 40,
            insurance: 30,
            location: 20,
            modality: 10,
            hand_raised: 20,
            threshold: 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_past_cap() {
        let weights = MatchWeights::default();
        let breakdown = DimensionBreakdown {
            diagnosis: weights.diagnosis,
            insurance: weights.insurance,
            location: weights.location,
            modality: weights.modality,
            hand_raised: weights.hand_raised,
        };
        assert_eq!(breakdown.total(), 120);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_threshold_above_cap_rejected() {
        let weights = MatchWeights {
            threshold: 101,
            ..MatchWeights::default()
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigurationError::ThresholdOutOfRange(101))
        ));
    }

    #[test]
    fn test_overflowing_weights_rejected() {
        let weights = MatchWeights {
            diagnosis: 2_000_000_000,
            insurance: 2_000_000_000,
            location: 1_000_000_000,
            ..MatchWeights::default()
        };
        assert_eq!(weights.max_raw_score(), None);
        assert!(matches!(
            weights.validate(),
            Err(ConfigurationError::WeightTotalOverflow)
        ));
    }

    #[test]
    fn test_breakdown_total_saturates() {
        let breakdown = DimensionBreakdown {
            diagnosis: u32::MAX,
            insurance: 30,
            ..DimensionBreakdown::default()
        };
        assert_eq!(breakdown.total(), u32::MAX);
    }

    #[test]
    fn test_patient_deserializes_snake_and_camel() {
        let camel: PatientMatchInput = serde_json::from_str(
            r#"{"id":"p1","diagnosis":["Anxiety"],"insuranceProvider":"BCBS","preferredModality":"either","handRaised":true}"#,
        )
        .unwrap();
        let snake: PatientMatchInput = serde_json::from_str(
            r#"{"id":"p1","diagnosis":["Anxiety"],"insurance_provider":"BCBS","preferred_modality":"both","hand_raised":true}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.preferred_gender, GenderPreference::NoPreference);
    }

    #[test]
    fn test_modality_aliases() {
        let provider: ProviderMatchInput = serde_json::from_str(
            r#"{"id":"dr1","modality_offered":["telehealth","in_person"],"gender":"nonbinary"}"#,
        )
        .unwrap();
        assert_eq!(provider.modality_offered, vec![Modality::Virtual, Modality::InPerson]);
        assert_eq!(provider.gender, Some(Gender::Other));
    }
}
