// Criterion benchmarks for Waitlist Match

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use waitlist_match::core::{Matcher, Taxonomy};
use waitlist_match::models::{GenderPreference, Modality, ModalityPreference, PatientMatchInput, ProviderMatchInput};
use chrono::{Duration, TimeZone, Utc};

const DIAGNOSES: &[&str] = &["anxious", "low mood", "PTSD", "insomnia", "Tinnitus", "grieving"];
const INSURERS: &[&str] = &["BCBS", "uhc", "Aetna", "Cigna", "Oscar Health"];
const CITIES: &[&str] = &["NYC", "Brooklyn", "Boston"];

fn create_candidate(id: usize) -> PatientMatchInput {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    PatientMatchInput {
        id: format!("patient-{}", id),
        diagnosis: vec![DIAGNOSES[id % DIAGNOSES.len()].to_string()],
        insurance_provider: Some(INSURERS[id % INSURERS.len()].to_string()),
        preferred_modality: Some(if id % 3 == 0 { ModalityPreference::Either } else { ModalityPreference::InPerson }),
        preferred_gender: GenderPreference::NoPreference,
        location: Some(CITIES[id % CITIES.len()].to_string()),
        hand_raised: id % 7 == 0,
        joined_at: Some(base + Duration::hours((id % 500) as i64)),
    }
}

fn create_provider() -> ProviderMatchInput {
    ProviderMatchInput {
        id: "provider-1".to_string(),
        specialties: vec!["Anxiety".to_string(), "Depression".to_string(), "Trauma".to_string()],
        insurance_accepted: vec!["Blue Cross Blue Shield".to_string(), "Aetna".to_string()],
        modality_offered: vec![Modality::Virtual],
        gender: None,
        location: Some("NYC".to_string()),
    }
}

fn bench_normalize(c: &mut Criterion) {
    let taxonomy = Taxonomy::builtin();

    c.bench_function("normalize_diagnosis", |b| {
        b.iter(|| taxonomy.normalize_diagnosis(black_box("Generalized anxiety with panic")));
    });

    c.bench_function("normalize_insurance", |b| {
        b.iter(|| taxonomy.normalize_insurance(black_box("Anthem Blue Cross")));
    });
}

fn bench_score(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let patient = create_candidate(0);
    let provider = create_provider();

    c.bench_function("score_match", |b| {
        b.iter(|| matcher.score(black_box(&patient), black_box(&provider)));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let provider = create_provider();

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<PatientMatchInput> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(candidate_count),
            &candidates,
            |b, candidates| {
                b.iter(|| matcher.rank(black_box(&provider), black_box(candidates), Some(20)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_score, bench_ranking);
criterion_main!(benches);
