use thiserror::Error;

/// Errors raised while loading matching configuration
///
/// These surface at start-up, before any patient is scored. Invalid values
/// are never clamped.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Weight for {dimension} must not be negative (got {value})")]
    NegativeWeight { dimension: &'static str, value: i64 },

    #[error("Match threshold must be within 0-100 (got {0})")]
    ThresholdOutOfRange(i64),

    #[error("Weights sum past the largest representable score")]
    WeightTotalOverflow,

    #[error("Invalid result limits: {0}")]
    InvalidLimit(String),

    #[error("Failed to read taxonomy file {path}: {source}")]
    TaxonomyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid taxonomy file: {0}")]
    TaxonomyParse(#[from] toml::de::Error),

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}
