use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::core::{Matcher, RankOptions, Taxonomy};
use crate::error::ConfigurationError;
use crate::models::MatchWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub supabase: Option<SupabaseSettings>,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    pub providers_table: Option<String>,
    pub slots_table: Option<String>,
    pub waitlist_table: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Rows requested per waitlist page; keep at or below the API's max-rows
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub enforce_gender_preference: bool,
    pub default_limit: Option<u16>,
    pub max_limit: Option<u16>,
    /// TOML file replacing the compiled-in synonym tables
    pub taxonomy_path: Option<String>,
}

impl MatchingSettings {
    /// Resolved `(default_limit, max_limit)` for rank responses
    pub fn limits(&self) -> Result<(u16, u16), ConfigurationError> {
        let max_limit = self.max_limit.unwrap_or(100);
        let default_limit = self.default_limit.unwrap_or_else(|| max_limit.min(20));

        if max_limit == 0 {
            return Err(ConfigurationError::InvalidLimit("max_limit must be at least 1".into()));
        }
        if default_limit == 0 || default_limit > max_limit {
            return Err(ConfigurationError::InvalidLimit(format!(
                "default_limit must be within 1-{} (got {})",
                max_limit, default_limit
            )));
        }
        Ok((default_limit, max_limit))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

/// Raw weight table as written by a practice
///
/// Signed so that a negative value is reported instead of failing to parse.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_diagnosis_weight")]
    pub diagnosis: i64,
    #[serde(default = "default_insurance_weight")]
    pub insurance: i64,
    #[serde(default = "default_location_weight")]
    pub location: i64,
    #[serde(default = "default_modality_weight")]
    pub modality: i64,
    #[serde(default = "default_hand_raised_weight")]
    pub hand_raised: i64,
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            diagnosis: default_diagnosis_weight(),
            insurance: default_insurance_weight(),
            location: default_location_weight(),
            modality: default_modality_weight(),
            hand_raised: default_hand_raised_weight(),
            threshold: default_threshold(),
        }
    }
}

fn default_diagnosis_weight() -> i64 { 40 }
fn default_insurance_weight() -> i64 { 30 }
fn default_location_weight() -> i64 { 20 }
fn default_modality_weight() -> i64 { 10 }
fn default_hand_raised_weight() -> i64 { 20 }
fn default_threshold() -> i64 { 70 }

impl WeightsConfig {
    /// Validate into the weight table the scorer uses
    pub fn to_weights(&self) -> Result<MatchWeights, ConfigurationError> {
        if !(0..=100).contains(&self.threshold) {
            return Err(ConfigurationError::ThresholdOutOfRange(self.threshold));
        }

        let weights = MatchWeights {
            diagnosis: weight("diagnosis", self.diagnosis)?,
            insurance: weight("insurance", self.insurance)?,
            location: weight("location", self.location)?,
            modality: weight("modality", self.modality)?,
            hand_raised: weight("hand_raised", self.hand_raised)?,
            threshold: self.threshold as u32,
        };
        weights.validate()?;
        Ok(weights)
    }
}

fn weight(dimension: &'static str, value: i64) -> Result<u32, ConfigurationError> {
    if value < 0 {
        return Err(ConfigurationError::NegativeWeight { dimension, value });
    }
    u32::try_from(value).map_err(|_| ConfigurationError::WeightTotalOverflow)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// `LOG_LEVEL` and `LOG_FORMAT` win over the `[logging]` section
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok())
    }

    fn with_overrides(self, level: Option<String>, format: Option<String>) -> Self {
        Self {
            level: level.unwrap_or(self.level),
            format: format.unwrap_or(self.format),
        }
    }

    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with WAITLIST__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., WAITLIST__SCORING__WEIGHTS__THRESHOLD -> scoring.weights.threshold
            .add_source(
                Environment::with_prefix("WAITLIST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("WAITLIST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Build the matcher described by the scoring and matching sections
    ///
    /// Fails on a bad weight table, unusable result limits or an unreadable
    /// taxonomy file, so a
    /// misconfigured practice never gets rankings.
    pub fn build_matcher(&self) -> Result<Matcher, ConfigurationError> {
        let weights = self.scoring.weights.to_weights()?;
        self.matching.limits()?;
        let taxonomy = match &self.matching.taxonomy_path {
            Some(path) => Taxonomy::load(path)?,
            None => Taxonomy::builtin(),
        };

        Ok(Matcher::new(weights, Arc::new(taxonomy))?.with_options(RankOptions {
            enforce_gender_preference: self.matching.enforce_gender_preference,
        }))
    }
}

/// Pick up the hosted database credentials from their conventional variables
///
/// `SUPABASE_URL` and `SUPABASE_SERVICE_KEY` (or `SUPABASE_ANON_KEY`) override
/// the `supabase` section when set.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let url = env::var("SUPABASE_URL").ok();
    let api_key = env::var("SUPABASE_SERVICE_KEY")
        .or_else(|_| env::var("SUPABASE_ANON_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = url {
        builder = builder.set_override("supabase.url", url)?;
    }
    if let Some(api_key) = api_key {
        builder = builder.set_override("supabase.api_key", api_key)?;
    }

    builder.build()
}
