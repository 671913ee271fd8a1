use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// One canonical term and the free-text variants that map onto it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermGroup {
    pub canonical: String,
    #[serde(default, alias = "aliases")]
    pub synonyms: Vec<String>,
}

/// On-disk taxonomy overrides
///
/// A section that is present replaces the compiled-in table of the same kind;
/// a missing section keeps the compiled-in one.
///
/// ```toml
/// [[diagnosis]]
/// canonical = "Anxiety"
/// synonyms = ["panic", "anxious"]
///
/// [[insurance]]
/// canonical = "Blue Cross Blue Shield"
/// aliases = ["BCBS"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyFile {
    pub diagnosis: Option<Vec<TermGroup>>,
    pub insurance: Option<Vec<TermGroup>>,
}

#[derive(Debug, Clone)]
struct Entry {
    canonical: String,
    canonical_lower: String,
    // lowercase, includes the canonical term itself
    needles: Vec<String>,
}

impl Entry {
    fn from_group(group: &TermGroup, kind: &str) -> Result<Self, ConfigurationError> {
        let canonical = group.canonical.trim().to_string();
        if canonical.is_empty() {
            return Err(ConfigurationError::InvalidTaxonomy(format!(
                "{} entry with an empty canonical term",
                kind
            )));
        }

        let canonical_lower = canonical.to_lowercase();
        let mut needles = vec![canonical_lower.clone()];
        for synonym in &group.synonyms {
            let needle = synonym.trim().to_lowercase();
            if needle.is_empty() {
                return Err(ConfigurationError::InvalidTaxonomy(format!(
                    "{} entry '{}' has an empty synonym",
                    kind, canonical
                )));
            }
            if !needles.contains(&needle) {
                needles.push(needle);
            }
        }

        Ok(Self {
            canonical,
            canonical_lower,
            needles,
        })
    }
}

/// Immutable diagnosis and insurance lookup tables
///
/// Built once and shared behind an `Arc`; swapping tables means building a new
/// value. Entries keep their declaration order so lookups are deterministic.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    diagnoses: Vec<Entry>,
    insurers: Vec<Entry>,
}

impl Taxonomy {
    pub fn new(
        diagnoses: &[TermGroup],
        insurers: &[TermGroup],
    ) -> Result<Self, ConfigurationError> {
        let diagnoses = diagnoses
            .iter()
            .map(|g| Entry::from_group(g, "diagnosis"))
            .collect::<Result<Vec<_>, _>>()?;
        let insurers = insurers
            .iter()
            .map(|g| Entry::from_group(g, "insurance"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { diagnoses, insurers })
    }

    /// Compiled-in tables for a behavioral health practice
    pub fn builtin() -> Self {
        let diagnoses = groups(BUILTIN_DIAGNOSES);
        let insurers = groups(BUILTIN_INSURERS);
        // The static tables contain no empty terms
        Self::new(&diagnoses, &insurers).unwrap_or_else(|_| Self {
            diagnoses: Vec::new(),
            insurers: Vec::new(),
        })
    }

    /// Parse a TOML override document on top of the compiled-in tables
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigurationError> {
        let file: TaxonomyFile = toml::from_str(source)?;
        let diagnoses = file.diagnosis.unwrap_or_else(|| groups(BUILTIN_DIAGNOSES));
        let insurers = file.insurance.unwrap_or_else(|| groups(BUILTIN_INSURERS));
        Self::new(&diagnoses, &insurers)
    }

    /// Load a TOML override file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::TaxonomyIo {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&source)
    }

    pub fn diagnosis_count(&self) -> usize {
        self.diagnoses.len()
    }

    pub fn insurer_count(&self) -> usize {
        self.insurers.len()
    }

    /// Map a free-text condition label to the canonical conditions it mentions
    ///
    /// Case-insensitive and substring-tolerant: `"Generalized anxiety, panic"`
    /// maps to `{"Anxiety"}`. Text naming nothing known comes back trimmed as a
    /// single-element set; blank text yields an empty set.
    pub fn normalize_diagnosis(&self, raw: &str) -> BTreeSet<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return BTreeSet::new();
        }

        let lower = trimmed.to_lowercase();
        let mut canonical: BTreeSet<String> = self
            .diagnoses
            .iter()
            .filter(|entry| entry.needles.iter().any(|needle| lower.contains(needle.as_str())))
            .map(|entry| entry.canonical.clone())
            .collect();

        if canonical.is_empty() {
            canonical.insert(trimmed.to_string());
        }
        canonical
    }

    /// Map an insurer name or abbreviation to its canonical name
    ///
    /// Exact canonical names win, then exact aliases, then the longest
    /// alias contained in the text. Unknown names come back trimmed.
    pub fn normalize_insurance(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        if lower.is_empty() {
            return String::new();
        }

        if let Some(entry) = self.insurers.iter().find(|e| e.canonical_lower == lower) {
            return entry.canonical.clone();
        }

        if let Some(entry) = self
            .insurers
            .iter()
            .find(|e| e.needles.iter().any(|needle| *needle == lower))
        {
            return entry.canonical.clone();
        }

        let mut best: Option<(&Entry, usize)> = None;
        for entry in &self.insurers {
            for needle in &entry.needles {
                if lower.contains(needle.as_str()) {
                    let longer = best.map_or(true, |(_, len)| needle.len() > len);
                    if longer {
                        best = Some((entry, needle.len()));
                    }
                }
            }
        }

        match best {
            Some((entry, _)) => entry.canonical.clone(),
            None => trimmed.to_string(),
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// See [`Taxonomy::normalize_diagnosis`]
pub fn normalize_diagnosis(taxonomy: &Taxonomy, raw: &str) -> BTreeSet<String> {
    taxonomy.normalize_diagnosis(raw)
}

/// See [`Taxonomy::normalize_insurance`]
pub fn normalize_insurance(taxonomy: &Taxonomy, raw: &str) -> String {
    taxonomy.normalize_insurance(raw)
}

fn groups(table: &[(&str, &[&str])]) -> Vec<TermGroup> {
    table
        .iter()
        .map(|(canonical, synonyms)| TermGroup {
            canonical: canonical.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

const BUILTIN_DIAGNOSES: &[(&str, &[&str])] = &[
    ("Anxiety", &["anxiety disorders", "anxious", "panic", "stress management", "phobia", "worry"]),
    ("Depression", &["depressed", "depressive", "low mood", "major depressive", "mdd"]),
    ("Trauma", &["ptsd", "post-traumatic", "post traumatic", "traumatic stress"]),
    ("ADHD", &["attention deficit", "hyperactivity", "add/adhd"]),
    ("Bipolar Disorder", &["bipolar", "manic", "mania"]),
    ("OCD", &["obsessive", "compulsive"]),
    ("Eating Disorders", &["eating disorder", "anorexia", "bulimia", "binge eating"]),
    ("Substance Use", &["substance", "addiction", "alcohol", "opioid", "recovery"]),
    ("Sleep Disorders", &["insomnia", "sleep"]),
    ("Grief", &["bereavement", "grieving"]),
    ("Relationship Issues", &["relationship", "couples", "marital", "marriage"]),
];

const BUILTIN_INSURERS: &[(&str, &[&str])] = &[
    ("Blue Cross Blue Shield", &["bcbs", "blue cross", "blue shield", "bluecross", "anthem"]),
    ("United Healthcare", &["united", "uhc", "unitedhealthcare", "united health care", "optum"]),
    ("Aetna", &["aetna health", "aetna cvs"]),
    ("Cigna", &["cigna healthcare", "evernorth"]),
    ("Humana", &[]),
    ("Kaiser Permanente", &["kaiser"]),
    ("Medicare", &["medicare advantage"]),
    ("Medicaid", &["medi-cal", "masshealth"]),
    ("Tricare", &[]),
    ("Self Pay", &["self-pay", "private pay", "cash", "out of pocket"]),
];
