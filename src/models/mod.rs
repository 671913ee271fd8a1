// Model exports
pub mod domain;
pub mod records;
pub mod requests;
pub mod responses;

pub use domain::{
    DimensionBreakdown, Gender, GenderPreference, MatchResult, MatchWeights, Modality,
    ModalityPreference, PatientMatchInput, ProviderMatchInput, RankedMatch, MAX_REPORTED_SCORE,
};
pub use records::{Labels, PatientRow, ProviderRow, SlotRow, WaitlistRow};
pub use requests::{NormalizeRequest, RankRequest, ScoreRequest, SlotMatchesQuery};
pub use responses::{ErrorResponse, HealthResponse, NormalizeResponse, RankResponse};
