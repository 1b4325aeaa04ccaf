//! Resolver tuning.
//!
//! The fuzzy tier's metric and acceptance threshold are tuning parameters,
//! so they live here instead of being baked into the engine. A config file
//! looks like:
//!
//! ```toml
//! [fuzzy]
//! metric = "levenshtein"
//! max_distance = 2
//! min_length = 4
//!
//! [composite]
//! co_occurrence = true
//! knot_only_fallback = true
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_MAX_DISTANCE: usize = 2;
const DEFAULT_MIN_LENGTH: usize = 4;

fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub fuzzy: FuzzyConfig,
    pub composite: CompositeConfig,
}

/// Distance metric and acceptance bound of the fuzzy tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case", deny_unknown_fields)]
pub enum FuzzyConfig {
    /// Plain edit distance between normalized strings; accept `<= max_distance`.
    Levenshtein {
        max_distance: usize,
        #[serde(default = "default_min_length")]
        min_length: usize,
    },
    /// Edit distance scaled to `0.0..=1.0`; accept similarity `>= min_similarity`.
    NormalizedLevenshtein {
        min_similarity: f64,
        #[serde(default = "default_min_length")]
        min_length: usize,
    },
    Disabled,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig::Levenshtein { max_distance: DEFAULT_MAX_DISTANCE, min_length: DEFAULT_MIN_LENGTH }
    }
}

impl FuzzyConfig {
    /// Shortest normalized mention (in chars) the tier will consider.
    pub fn min_length(&self) -> usize {
        match self {
            FuzzyConfig::Levenshtein { min_length, .. } | FuzzyConfig::NormalizedLevenshtein { min_length, .. } => {
                *min_length
            }
            FuzzyConfig::Disabled => usize::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeConfig {
    /// Look for handle and knot matches in disjoint spans when no split
    /// delimiter is present.
    #[serde(default = "default_true")]
    pub co_occurrence: bool,
    /// Resolve a bare knot mention ("Declaration B15") through the knot catalog
    /// when the brush catalog has no entry for it.
    #[serde(default = "default_true")]
    pub knot_only_fallback: bool,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        CompositeConfig { co_occurrence: true, knot_only_fallback: true }
    }
}

impl ResolverConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let FuzzyConfig::NormalizedLevenshtein { min_similarity, .. } = self.fuzzy {
            if !(min_similarity > 0.0 && min_similarity <= 1.0) {
                return Err(Error::Config(format!("fuzzy.min_similarity must be in (0, 1], got {min_similarity}")));
            }
        }
        if self.fuzzy.min_length() == 0 {
            return Err(Error::Config("fuzzy.min_length must be at least 1".into()));
        }
        Ok(())
    }
}
