// Core algorithm exports
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod taxonomy;

pub use filters::{gender_preference_satisfied, insurance_accepted, modality_satisfied, same_location, shared_conditions};
pub use matcher::{rank_candidates, Matcher, RankOptions, RankedMatches};
pub use scoring::score_match;
pub use taxonomy::{normalize_diagnosis, normalize_insurance, Taxonomy, TaxonomyFile, TermGroup};
