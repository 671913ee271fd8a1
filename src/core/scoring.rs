use crate::core::filters::{
    gender_preference_satisfied, insurance_accepted, modality_satisfied, same_location,
    shared_conditions,
};
use crate::core::taxonomy::Taxonomy;
use crate::models::{
    DimensionBreakdown, MatchResult, MatchWeights, PatientMatchInput, ProviderMatchInput,
    MAX_REPORTED_SCORE,
};

/// Score a (patient, provider) pair
///
/// Scoring table (default points):
/// score = min(100,
///     diagnosis  40 +   # any normalized diagnosis is a provider specialty
///     insurance  30 +   # normalized insurer is accepted
///     location   20 +   # same city/region token
///     modality   10 +   # "either", or a modality the provider offers
///     hand_raised 20    # patient signaled urgency
/// )
///
/// Each dimension is all-or-nothing. Missing data scores zero on its
/// dimension. Pure and total: no I/O, no state, never fails.
pub fn score_match(
    patient: &PatientMatchInput,
    provider: &ProviderMatchInput,
    weights: &MatchWeights,
    taxonomy: &Taxonomy,
) -> MatchResult {
    let matched_conditions =
        shared_conditions(taxonomy, &patient.diagnosis, &provider.specialties);

    let breakdown = DimensionBreakdown {
        diagnosis: points(!matched_conditions.is_empty(), weights.diagnosis),
        insurance: points(
            insurance_accepted(
                taxonomy,
                patient.insurance_provider.as_deref(),
                &provider.insurance_accepted,
            ),
            weights.insurance,
        ),
        location: points(
            same_location(patient.location.as_deref(), provider.location.as_deref()),
            weights.location,
        ),
        modality: points(
            modality_satisfied(patient.preferred_modality, &provider.modality_offered),
            weights.modality,
        ),
        hand_raised: points(patient.hand_raised, weights.hand_raised),
    };

    let raw_score = breakdown.total();
    let score = raw_score.min(MAX_REPORTED_SCORE);

    MatchResult {
        score,
        raw_score,
        breakdown,
        matched_conditions,
        gender_preference_met: gender_preference_satisfied(
            patient.preferred_gender,
            provider.gender,
        ),
        is_match: score >= weights.threshold,
    }
}

#[inline]
fn points(satisfied: bool, weight: u32) -> u32 {
    if satisfied {
        weight
    } else {
        0
    }
}
