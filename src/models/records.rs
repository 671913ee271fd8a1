//! Row shapes returned by the hosted database and their conversion into
//! matching inputs.
//!
//! Rows written by different versions of the front end disagree on field
//! names and types (`insurance` vs `insurance_provider`, a diagnosis string vs
//! an array, numeric vs string ids). Everything downstream of this module sees
//! only [`PatientMatchInput`] and [`ProviderMatchInput`].

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{
    Gender, GenderPreference, Modality, ModalityPreference, PatientMatchInput, ProviderMatchInput,
};

/// Priority scores above this count as a raised hand when the flag is absent
pub const HAND_RAISED_PRIORITY_FALLBACK: f64 = 80.0;

/// A text field stored either as one string or as an array
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Labels {
    One(String),
    Many(Vec<String>),
}

impl Labels {
    /// Split into trimmed, non-empty labels, keeping order
    pub fn into_vec(self) -> Vec<String> {
        let raw = match self {
            Labels::One(text) => text.split([',', ';']).map(str::to_string).collect(),
            Labels::Many(items) => items,
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Patient columns, either embedded in a waitlist row or stored on it directly
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientRow {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    #[serde(default, alias = "diagnoses", alias = "conditions")]
    pub diagnosis: Option<Labels>,
    #[serde(default, alias = "insuranceProvider")]
    pub insurance_provider: Option<String>,
    #[serde(default)]
    pub insurance: Option<String>,
    #[serde(default, alias = "preferredModality", alias = "modality_preference")]
    pub preferred_modality: Option<String>,
    #[serde(default, alias = "preferredGender", alias = "gender_preference")]
    pub preferred_gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "handRaised")]
    pub hand_raised: Option<bool>,
}

/// One row of `waitlist_entries`, optionally with the patient embedded
#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistRow {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, alias = "patientId", deserialize_with = "optional_id")]
    pub patient_id: Option<String>,
    #[serde(default, alias = "priorityScore")]
    pub priority_score: Option<f64>,
    #[serde(default, alias = "joinedAt")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "patient")]
    pub patients: Option<PatientRow>,
    #[serde(flatten)]
    pub inline: PatientRow,
}

impl WaitlistRow {
    /// Convert to a scorer input
    ///
    /// Entry-level columns win over the embedded patient. When no explicit
    /// hand-raised flag exists anywhere, a priority score above
    /// [`HAND_RAISED_PRIORITY_FALLBACK`] stands in for it.
    pub fn into_patient(self) -> PatientMatchInput {
        let embedded = self.patients.unwrap_or_default();
        let inline = self.inline;

        let id = self
            .patient_id
            .or(embedded.id.clone())
            .unwrap_or_else(|| self.id.clone());

        let diagnosis = inline
            .diagnosis
            .or(embedded.diagnosis)
            .map(Labels::into_vec)
            .unwrap_or_default();

        let insurance_provider = first_text([
            inline.insurance_provider,
            inline.insurance,
            embedded.insurance_provider,
            embedded.insurance,
        ]);

        let preferred_modality = first_text([inline.preferred_modality, embedded.preferred_modality])
            .and_then(|raw| parse_modality_preference(&raw));

        let preferred_gender = first_text([inline.preferred_gender, embedded.preferred_gender])
            .map(|raw| parse_gender_preference(&raw))
            .unwrap_or_default();

        let location = first_text([inline.location, inline.city, embedded.location, embedded.city]);

        let hand_raised = inline
            .hand_raised
            .or(embedded.hand_raised)
            .unwrap_or_else(|| {
                self.priority_score
                    .map_or(false, |score| score > HAND_RAISED_PRIORITY_FALLBACK)
            });

        PatientMatchInput {
            id,
            diagnosis,
            insurance_provider,
            preferred_modality,
            preferred_gender,
            location,
            hand_raised,
            joined_at: self.joined_at.or(self.created_at),
        }
    }
}

/// One row of `providers`
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRow {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, alias = "specialty", alias = "specializations")]
    pub specialties: Option<Labels>,
    #[serde(default, alias = "insuranceAccepted", alias = "accepted_insurance", alias = "insurances")]
    pub insurance_accepted: Option<Labels>,
    #[serde(default, alias = "modalityOffered", alias = "modalities", alias = "modality")]
    pub modality_offered: Option<Labels>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl ProviderRow {
    pub fn into_provider(self) -> ProviderMatchInput {
        let mut modality_offered: Vec<Modality> = self
            .modality_offered
            .map(Labels::into_vec)
            .unwrap_or_default()
            .iter()
            .flat_map(|raw| parse_offered_modalities(raw))
            .collect();
        modality_offered.sort();
        modality_offered.dedup();

        ProviderMatchInput {
            id: self.id,
            specialties: self.specialties.map(Labels::into_vec).unwrap_or_default(),
            insurance_accepted: self.insurance_accepted.map(Labels::into_vec).unwrap_or_default(),
            modality_offered,
            gender: self.gender.as_deref().and_then(parse_gender),
            location: first_text([self.location, self.city]),
        }
    }
}

/// One row of `provider_slots` with its provider embedded
#[derive(Debug, Clone, Deserialize)]
pub struct SlotRow {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, alias = "providerId", deserialize_with = "optional_id")]
    pub provider_id: Option<String>,
    #[serde(default, alias = "provider")]
    pub providers: Option<ProviderRow>,
}

fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn canonical_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect()
}

pub fn parse_modality_preference(raw: &str) -> Option<ModalityPreference> {
    match canonical_key(raw).as_str() {
        "in-person" | "inperson" | "office" => Some(ModalityPreference::InPerson),
        "virtual" | "telehealth" | "video" | "online" => Some(ModalityPreference::Virtual),
        "either" | "both" | "any" | "no-preference" => Some(ModalityPreference::Either),
        _ => None,
    }
}

fn parse_offered_modalities(raw: &str) -> Vec<Modality> {
    match canonical_key(raw).as_str() {
        "in-person" | "inperson" | "office" => vec![Modality::InPerson],
        "virtual" | "telehealth" | "video" | "online" => vec![Modality::Virtual],
        "both" | "either" | "hybrid" => vec![Modality::InPerson, Modality::Virtual],
        _ => Vec::new(),
    }
}

pub fn parse_gender_preference(raw: &str) -> GenderPreference {
    match canonical_key(raw).as_str() {
        "male" | "man" | "m" => GenderPreference::Male,
        "female" | "woman" | "f" => GenderPreference::Female,
        _ => GenderPreference::NoPreference,
    }
}

fn parse_gender(raw: &str) -> Option<Gender> {
    match canonical_key(raw).as_str() {
        "" => None,
        "male" | "man" | "m" => Some(Gender::Male),
        "female" | "woman" | "f" => Some(Gender::Female),
        _ => Some(Gender::Other),
    }
}

fn id_from_value<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(E::custom(format!("invalid id: {}", other))),
    }
}

fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)?
        .ok_or_else(|| de::Error::custom("id must not be null"))
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_waitlist_row_with_embedded_patient() {
        let row: WaitlistRow = serde_json::from_value(json!({
            "id": 17,
            "patient_id": "pat-1",
            "status": "active",
            "created_at": "2024-03-01T10:00:00Z",
            "patients": {
                "id": "pat-1",
                "diagnosis": "Anxiety, insomnia",
                "insurance": "BCBS",
                "modality_preference": "In Person",
                "gender_preference": "female",
                "city": "NYC"
            }
        }))
        .unwrap();

        let patient = row.into_patient();
        assert_eq!(patient.id, "pat-1");
        assert_eq!(patient.diagnosis, vec!["Anxiety", "insomnia"]);
        assert_eq!(patient.insurance_provider.as_deref(), Some("BCBS"));
        assert_eq!(patient.preferred_modality, Some(ModalityPreference::InPerson));
        assert_eq!(patient.preferred_gender, GenderPreference::Female);
        assert_eq!(patient.location.as_deref(), Some("NYC"));
        assert!(!patient.hand_raised);
        assert!(patient.joined_at.is_some());
    }

    #[test]
    fn test_priority_score_fallback_only_without_flag() {
        let inferred: WaitlistRow =
            serde_json::from_value(json!({ "id": "w1", "priority_score": 85 })).unwrap();
        assert!(inferred.into_patient().hand_raised);

        let boundary: WaitlistRow =
            serde_json::from_value(json!({ "id": "w2", "priority_score": 80 })).unwrap();
        assert!(!boundary.into_patient().hand_raised);

        let explicit: WaitlistRow = serde_json::from_value(
            json!({ "id": "w3", "priority_score": 95, "hand_raised": false }),
        )
        .unwrap();
        assert!(!explicit.into_patient().hand_raised);
    }

    #[test]
    fn test_entry_id_used_when_patient_unknown() {
        let row: WaitlistRow =
            serde_json::from_value(json!({ "id": "w9", "diagnosis": ["Grief"] })).unwrap();
        let patient = row.into_patient();
        assert_eq!(patient.id, "w9");
        assert_eq!(patient.diagnosis, vec!["Grief"]);
        assert_eq!(patient.preferred_modality, None);
    }

    #[test]
    fn test_provider_row_variants() {
        let row: ProviderRow = serde_json::from_value(json!({
            "id": 4,
            "specialty": "Anxiety; Depression",
            "accepted_insurance": ["Aetna", "UHC"],
            "modalities": ["both"],
            "gender": "Female",
            "location": "  "
        }))
        .unwrap();

        let provider = row.into_provider();
        assert_eq!(provider.id, "4");
        assert_eq!(provider.specialties, vec!["Anxiety", "Depression"]);
        assert_eq!(provider.insurance_accepted, vec!["Aetna", "UHC"]);
        assert_eq!(provider.modality_offered, vec![Modality::InPerson, Modality::Virtual]);
        assert_eq!(provider.gender, Some(Gender::Female));
        assert_eq!(provider.location, None);
    }

    #[test]
    fn test_null_id_rejected() {
        let result: Result<ProviderRow, _> = serde_json::from_value(json!({ "id": null }));
        assert!(result.is_err());
    }
}
