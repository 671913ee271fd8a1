use std::collections::BTreeMap;

use crate::core::taxonomy::Taxonomy;
use crate::models::{Gender, GenderPreference, Modality, ModalityPreference};

/// Canonical conditions shared by a patient's diagnoses and a provider's specialties
///
/// Both sides are normalized through the taxonomy and compared
/// case-insensitively. Returned names use the patient side's spelling, sorted.
pub fn shared_conditions(
    taxonomy: &Taxonomy,
    diagnoses: &[String],
    specialties: &[String],
) -> Vec<String> {
    let patient_terms = canonical_terms(taxonomy, diagnoses);
    if patient_terms.is_empty() {
        return Vec::new();
    }
    let provider_terms = canonical_terms(taxonomy, specialties);

    patient_terms
        .into_iter()
        .filter(|(key, _)| provider_terms.contains_key(key))
        .map(|(_, display)| display)
        .collect()
}

fn canonical_terms(taxonomy: &Taxonomy, labels: &[String]) -> BTreeMap<String, String> {
    labels
        .iter()
        .flat_map(|label| taxonomy.normalize_diagnosis(label))
        .map(|term| (term.to_lowercase(), term))
        .collect()
}

/// Whether the patient's insurer is on the provider's accepted list
#[inline]
pub fn insurance_accepted(
    taxonomy: &Taxonomy,
    insurance: Option<&str>,
    accepted: &[String],
) -> bool {
    let patient = match insurance.map(|raw| taxonomy.normalize_insurance(raw)) {
        Some(name) if !name.is_empty() => name.to_lowercase(),
        _ => return false,
    };

    accepted
        .iter()
        .map(|raw| taxonomy.normalize_insurance(raw))
        .any(|name| name.to_lowercase() == patient)
}

/// Coarse location equality on a city/region token
///
/// Trimmed, case-insensitive and whitespace-collapsed. No distance is computed.
#[inline]
pub fn same_location(patient: Option<&str>, provider: Option<&str>) -> bool {
    match (patient.and_then(location_token), provider.and_then(location_token)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn location_token(raw: &str) -> Option<String> {
    let token = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Whether the provider offers the way the patient wants to be seen
#[inline]
pub fn modality_satisfied(preference: Option<ModalityPreference>, offered: &[Modality]) -> bool {
    match preference {
        Some(ModalityPreference::Either) => true,
        Some(pref) => pref.modality().map_or(false, |m| offered.contains(&m)),
        None => false,
    }
}

/// Whether the provider's gender satisfies the patient's preference
///
/// A provider with no recorded gender only satisfies "no preference".
#[inline]
pub fn gender_preference_satisfied(preference: GenderPreference, gender: Option<Gender>) -> bool {
    match preference {
        GenderPreference::NoPreference => true,
        GenderPreference::Male => gender == Some(Gender::Male),
        GenderPreference::Female => gender == Some(Gender::Female),
    }
}
