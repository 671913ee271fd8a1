//! Waitlist Match - patient/provider matching for appointment waitlists
//!
//! Scores waitlisted patients against a provider's open slot (diagnosis,
//! insurance, location, modality and a raised-hand bonus) and orders the
//! waitlist deterministically. The scoring core is pure; the HTTP routes and
//! the hosted-database client are thin layers around it.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{normalize_diagnosis, normalize_insurance, rank_candidates, score_match, Matcher, RankOptions, RankedMatches, Taxonomy};
pub use error::ConfigurationError;
pub use models::{MatchResult, MatchWeights, PatientMatchInput, ProviderMatchInput, RankedMatch};
