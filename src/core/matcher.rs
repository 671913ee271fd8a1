use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{filters::gender_preference_satisfied, scoring::score_match, taxonomy::Taxonomy};
use crate::error::ConfigurationError;
use crate::models::{MatchResult, MatchWeights, PatientMatchInput, ProviderMatchInput, RankedMatch};

/// Ranking behavior beyond the point table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankOptions {
    /// Drop candidates whose provider-gender preference is not met
    pub enforce_gender_preference: bool,
}

/// Waitlist matches for one slot, best first
///
/// Finite and restartable: `iter` can be called any number of times and
/// always yields the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedMatches {
    matches: Vec<RankedMatch>,
    total_candidates: usize,
}

impl RankedMatches {
    pub fn iter(&self) -> std::slice::Iter<'_, RankedMatch> {
        self.matches.iter()
    }

    /// The first `k` matches
    pub fn top(&self, k: usize) -> impl Iterator<Item = &RankedMatch> + '_ {
        self.matches.iter().take(k)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of candidates considered before filtering
    pub fn total_candidates(&self) -> usize {
        self.total_candidates
    }

    pub fn truncate(&mut self, k: usize) {
        self.matches.truncate(k);
    }

    pub fn into_vec(self) -> Vec<RankedMatch> {
        self.matches
    }
}

impl<'a> IntoIterator for &'a RankedMatches {
    type Item = &'a RankedMatch;
    type IntoIter = std::slice::Iter<'a, RankedMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

impl IntoIterator for RankedMatches {
    type Item = RankedMatch;
    type IntoIter = std::vec::IntoIter<RankedMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// Rank waitlisted patients for a provider's open slot
///
/// # Pipeline Stages
/// 1. Optional gender-preference filter
/// 2. Independent scoring of every candidate
/// 3. Threshold filter (`is_match`)
/// 4. Ordering: score desc, raised hand first, earliest `joined_at` first,
///    patient id, then input position
///
/// An empty candidate list yields an empty result.
pub fn rank_candidates(
    provider: &ProviderMatchInput,
    patients: &[PatientMatchInput],
    weights: &MatchWeights,
    taxonomy: &Taxonomy,
    options: RankOptions,
) -> RankedMatches {
    let total_candidates = patients.len();

    let mut scored: Vec<(usize, &PatientMatchInput, MatchResult)> = patients
        .iter()
        .enumerate()
        .filter(|(_, patient)| {
            !options.enforce_gender_preference
                || gender_preference_satisfied(patient.preferred_gender, provider.gender)
        })
        .map(|(index, patient)| (index, patient, score_match(patient, provider, weights, taxonomy)))
        .filter(|(_, _, result)| result.is_match)
        .collect();

    scored.sort_by(|(a_index, a, a_result), (b_index, b, b_result)| {
        b_result
            .score
            .cmp(&a_result.score)
            .then_with(|| b.hand_raised.cmp(&a.hand_raised))
            .then_with(|| earliest_first(a.joined_at, b.joined_at))
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a_index.cmp(b_index))
    });

    let matches = scored
        .into_iter()
        .enumerate()
        .map(|(position, (_, patient, result))| RankedMatch {
            rank: position + 1,
            patient_id: patient.id.clone(),
            hand_raised: patient.hand_raised,
            joined_at: patient.joined_at,
            result,
        })
        .collect();

    RankedMatches {
        matches,
        total_candidates,
    }
}

// Entries without a join timestamp sort after every dated entry
fn earliest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Main matching orchestrator
///
/// Holds a validated weight table and an immutable taxonomy snapshot. Cheap
/// to clone and safe to share across worker threads; reconfiguring means
/// building a new `Matcher`.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: MatchWeights,
    taxonomy: Arc<Taxonomy>,
    options: RankOptions,
}

impl Matcher {
    pub fn new(weights: MatchWeights, taxonomy: Arc<Taxonomy>) -> Result<Self, ConfigurationError> {
        weights.validate()?;
        Ok(Self {
            weights,
            taxonomy,
            options: RankOptions::default(),
        })
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: MatchWeights::default(),
            taxonomy: Arc::new(Taxonomy::builtin()),
            options: RankOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RankOptions) -> Self {
        self.options = options;
        self
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn options(&self) -> RankOptions {
        self.options
    }

    pub fn score(&self, patient: &PatientMatchInput, provider: &ProviderMatchInput) -> MatchResult {
        score_match(patient, provider, &self.weights, &self.taxonomy)
    }

    /// Rank candidates for a provider, keeping at most `limit` matches
    pub fn rank(
        &self,
        provider: &ProviderMatchInput,
        patients: &[PatientMatchInput],
        limit: Option<usize>,
    ) -> RankedMatches {
        let mut ranked =
            rank_candidates(provider, patients, &self.weights, &self.taxonomy, self.options);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
