// Unit tests for Waitlist Match

use chrono::{TimeZone, Utc};
use waitlist_match::core::{normalize_diagnosis, normalize_insurance, rank_candidates, score_match, RankOptions, Taxonomy};
use waitlist_match::models::{Modality, ModalityPreference, GenderPreference, MatchWeights, PatientMatchInput, ProviderMatchInput};

fn create_test_patient(id: &str) -> PatientMatchInput {
    PatientMatchInput {
        id: id.to_string(),
        diagnosis: vec!["Anxiety".to_string()],
        insurance_provider: Some("BCBS".to_string()),
        preferred_modality: Some(ModalityPreference::Either),
        preferred_gender: GenderPreference::NoPreference,
        location: Some("NYC".to_string()),
        hand_raised: true,
        joined_at: None,
    }
}

fn create_test_provider() -> ProviderMatchInput {
    ProviderMatchInput {
        id: "provider-1".to_string(),
        specialties: vec!["Anxiety".to_string()],
        insurance_accepted: vec!["Blue Cross Blue Shield".to_string()],
        modality_offered: vec![Modality::Virtual],
        gender: None,
        location: Some("NYC".to_string()),
    }
}

fn unmatched_patient(id: &str) -> PatientMatchInput {
    PatientMatchInput {
        id: id.to_string(),
        diagnosis: vec!["Tinnitus".to_string()],
        insurance_provider: Some("Cigna".to_string()),
        preferred_modality: Some(ModalityPreference::InPerson),
        preferred_gender: GenderPreference::NoPreference,
        location: Some("Boston".to_string()),
        hand_raised: false,
        joined_at: None,
    }
}

#[test]
fn test_synonym_diagnosis_scores_full_points() {
    let taxonomy = Taxonomy::builtin();
    let mut patient = unmatched_patient("p1");
    patient.diagnosis = vec!["anxious".to_string()];

    let result = score_match(&patient, &create_test_provider(), &MatchWeights::default(), &taxonomy);
    assert_eq!(result.breakdown.diagnosis, 40);
}

#[test]
fn test_insurance_alias_scores_full_points() {
    let taxonomy = Taxonomy::builtin();
    let mut provider = create_test_provider();
    provider.insurance_accepted = vec!["Blue Cross Blue Shield".to_string(), "Aetna".to_string()];
    let mut patient = unmatched_patient("p1");
    patient.insurance_provider = Some("BCBS".to_string());

    let result = score_match(&patient, &provider, &MatchWeights::default(), &taxonomy);
    assert_eq!(result.breakdown.insurance, 30);
}

#[test]
fn test_everything_matches_with_hand_raised() {
    let taxonomy = Taxonomy::builtin();
    let result = score_match(&create_test_patient("p1"), &create_test_provider(), &MatchWeights::default(), &taxonomy);

    assert_eq!(result.breakdown.diagnosis, 40);
    assert_eq!(result.breakdown.insurance, 30);
    assert_eq!(result.breakdown.location, 20);
    assert_eq!(result.breakdown.modality, 10);
    assert_eq!(result.breakdown.hand_raised, 20);
    assert_eq!(result.raw_score, 120);
    assert_eq!(result.score, 100);
    assert!(result.is_match);
}

#[test]
fn test_everything_matches_without_hand_raised() {
    let taxonomy = Taxonomy::builtin();
    let mut patient = create_test_patient("p1");
    patient.hand_raised = false;

    let result = score_match(&patient, &create_test_provider(), &MatchWeights::default(), &taxonomy);
    assert_eq!(result.raw_score, 100);
    assert_eq!(result.score, 100);
    assert!(result.is_match);
}

#[test]
fn test_nothing_matches() {
    let taxonomy = Taxonomy::builtin();
    let result = score_match(&unmatched_patient("p1"), &create_test_provider(), &MatchWeights::default(), &taxonomy);

    assert_eq!(result.score, 0);
    assert_eq!(result.raw_score, 0);
    assert!(!result.is_match);
    assert!(result.matched_conditions.is_empty());
}

#[test]
fn test_missing_data_degrades_to_zero() {
    let taxonomy = Taxonomy::builtin();
    let patient = PatientMatchInput {
        id: "sparse".to_string(),
        diagnosis: vec![],
        insurance_provider: None,
        preferred_modality: None,
        preferred_gender: GenderPreference::NoPreference,
        location: None,
        hand_raised: false,
        joined_at: None,
    };

    let result = score_match(&patient, &create_test_provider(), &MatchWeights::default(), &taxonomy);
    assert_eq!(result.score, 0);
}

#[test]
fn test_equal_scores_rank_by_join_date() {
    let taxonomy = Taxonomy::builtin();
    let provider = create_test_provider();

    // diagnosis 40 + insurance 30 + location 20 = 90
    let make = |id: &str, day: u32| {
        let mut p = create_test_patient(id);
        p.hand_raised = false;
        p.preferred_modality = Some(ModalityPreference::InPerson);
        p.joined_at = Some(Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap());
        p
    };

    let patients = vec![make("newer", 20), make("older", 2)];
    let ranked = rank_candidates(&provider, &patients, &MatchWeights::default(), &taxonomy, RankOptions::default());

    let order: Vec<_> = ranked.iter().map(|m| (m.patient_id.as_str(), m.result.score)).collect();
    assert_eq!(order, vec![("older", 90), ("newer", 90)]);
}

#[test]
fn test_score_is_deterministic_and_bounded() {
    let taxonomy = Taxonomy::builtin();
    let weights = MatchWeights::default();
    let provider = create_test_provider();

    for hand_raised in [false, true] {
        for location in [None, Some("NYC"), Some("LA")] {
            for insurance in [None, Some("BCBS"), Some("Humana")] {
                let mut patient = create_test_patient("p");
                patient.hand_raised = hand_raised;
                patient.location = location.map(str::to_string);
                patient.insurance_provider = insurance.map(str::to_string);

                let first = score_match(&patient, &provider, &weights, &taxonomy);
                let second = score_match(&patient, &provider, &weights, &taxonomy);
                assert_eq!(first, second);
                assert!(first.score <= 100);
                assert_eq!(first.score, first.raw_score.min(100));
                assert_eq!(first.is_match, first.raw_score.min(100) >= weights.threshold);
            }
        }
    }
}

#[test]
fn test_raising_hand_never_lowers_score() {
    let taxonomy = Taxonomy::builtin();
    let weights = MatchWeights::default();

    for base in [unmatched_patient("a"), create_test_patient("b")] {
        let mut lowered = base.clone();
        lowered.hand_raised = false;
        let mut raised = base;
        raised.hand_raised = true;

        let low = score_match(&lowered, &create_test_provider(), &weights, &taxonomy);
        let high = score_match(&raised, &create_test_provider(), &weights, &taxonomy);
        assert!(high.score >= low.score);
    }
}

#[test]
fn test_normalize_insurance_idempotent() {
    let taxonomy = Taxonomy::builtin();
    for raw in ["BCBS", "Blue Cross", "UHC", "optum", "Tricare", "Local Co-op"] {
        let canonical = normalize_insurance(&taxonomy, raw);
        assert_eq!(normalize_insurance(&taxonomy, &canonical), canonical);
    }
}

#[test]
fn test_normalize_diagnosis_public_api() {
    let taxonomy = Taxonomy::builtin();
    let terms = normalize_diagnosis(&taxonomy, "PTSD after accident");
    assert!(terms.contains("Trauma"));
}

#[test]
fn test_injected_taxonomies_are_independent() {
    let custom = Taxonomy::from_toml_str(
        r#"
        [[diagnosis]]
        canonical = "Anxiety"
        synonyms = ["nervous"]
        "#,
    )
    .unwrap();
    let builtin = Taxonomy::builtin();

    let mut patient = unmatched_patient("p");
    patient.diagnosis = vec!["nervous".to_string()];

    let custom_result = score_match(&patient, &create_test_provider(), &MatchWeights::default(), &custom);
    let builtin_result = score_match(&patient, &create_test_provider(), &MatchWeights::default(), &builtin);

    assert_eq!(custom_result.breakdown.diagnosis, 40);
    assert_eq!(builtin_result.breakdown.diagnosis, 0);
}
