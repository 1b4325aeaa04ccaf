//! Deterministic resolution of free-text shaving gear mentions into curated
//! catalog entries.
//!
//! ```text
//! mention ── normalize ──▶ correct-match index ──▶ pattern tier ──▶ fuzzy tier
//!                           (exact)                (regex)          (edit distance)
//!                                 └──────── brush only: handle/knot composite ────────┘
//! ```
//!
//! Build a [`Resolver`] once (from a catalog directory or in-memory YAML) and
//! share it; [`resolve_records`] enriches whole record batches in parallel.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[macro_use]
mod macros;
mod api;
mod catalog;
mod config;
mod engine;
mod error;
mod normalize;
mod record;

#[cfg(test)]
mod fixtures;

pub use api::{Context, ResolutionVerbose, Resolver, ResolverBuilder, SelfCheckFailure};
pub use catalog::{Catalog, CatalogEntry, CatalogStore, CorrectMatchEntry, CorrectMatchIndex, CuratedString};
pub use config::{CompositeConfig, FuzzyConfig, ResolverConfig};
pub use engine::{RunMetrics, Tier, TierOutcome, TierTrace};
pub use error::{Error, Result};
pub use normalize::normalize;
pub use record::{BatchSummary, EnrichedRecord, Record, resolve_record, resolve_records};

// --- Categories and sections -------------------------------------------------

/// Product category of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Razor,
    Blade,
    Brush,
    Soap,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Razor, Category::Blade, Category::Brush, Category::Soap];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Razor => "razor",
            Category::Blade => "blade",
            Category::Brush => "brush",
            Category::Soap => "soap",
        }
    }

    /// Catalog / correct-match section holding whole products of this category.
    pub fn section(self) -> Section {
        match self {
            Category::Razor => Section::Razor,
            Category::Blade => Section::Blade,
            Category::Brush => Section::Brush,
            Category::Soap => Section::Soap,
        }
    }

    /// Whether a mention may denote a product assembled from two makers' parts.
    pub fn supports_composites(self) -> bool {
        matches!(self, Category::Brush)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "razor" | "razors" => Ok(Category::Razor),
            "blade" | "blades" => Ok(Category::Blade),
            "brush" | "brushes" => Ok(Category::Brush),
            "soap" | "soaps" => Ok(Category::Soap),
            other => Err(format!("unknown category '{other}' (expected razor, blade, brush or soap)")),
        }
    }
}

/// A catalog or correct-match section.
///
/// The four categories each have one; brushes additionally have part-only
/// `handle` and `knot` sections used by the composite resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Razor,
    Blade,
    Brush,
    Soap,
    Handle,
    Knot,
}

impl Section {
    pub const ALL: [Section; 6] =
        [Section::Razor, Section::Blade, Section::Brush, Section::Soap, Section::Handle, Section::Knot];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Razor => "razor",
            Section::Blade => "blade",
            Section::Brush => "brush",
            Section::Soap => "soap",
            Section::Handle => "handle",
            Section::Knot => "knot",
        }
    }

    /// File name of this section's catalog inside a catalog directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Section::Razor => "razors.yaml",
            Section::Blade => "blades.yaml",
            Section::Brush => "brushes.yaml",
            Section::Soap => "soaps.yaml",
            Section::Handle => "handles.yaml",
            Section::Knot => "knots.yaml",
        }
    }

    /// Parse a section key as written in `correct_matches.yaml`.
    pub fn from_key(key: &str) -> Option<Section> {
        match key {
            "razor" => Some(Section::Razor),
            "blade" => Some(Section::Blade),
            "brush" => Some(Section::Brush),
            "soap" => Some(Section::Soap),
            "handle" => Some(Section::Handle),
            "knot" => Some(Section::Knot),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Identities ----------------------------------------------------------------

/// Scalar catalog attribute (fiber, knot size, razor format, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

/// Attribute name → value. Ordered so serialized output is stable.
pub type Metadata = BTreeMap<String, AttrValue>;

/// A resolved `{brand, model}` plus catalog attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub brand: String,
    pub model: String,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl Identity {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Identity { brand: brand.into(), model: model.into(), metadata: Metadata::new() }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.metadata.insert(name.into(), value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.metadata.get(name)
    }

    pub fn fiber(&self) -> Option<&str> {
        self.attr("fiber").and_then(AttrValue::as_str)
    }

    pub fn knot_size_mm(&self) -> Option<f64> {
        self.attr("knot_size_mm").and_then(AttrValue::as_f64)
    }

    /// Razor/blade format such as `DE` or `GEM`.
    pub fn format(&self) -> Option<&str> {
        self.attr("format").and_then(AttrValue::as_str)
    }

    /// `"Brand Model"`, used for provenance and fuzzy canonical names.
    pub fn label(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

/// One resolved sub-part of a composite product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(flatten)]
    pub identity: Identity,
    /// Slice of the mention this part was resolved from.
    pub source_text: String,
    pub match_type: MatchType,
    pub source: Source,
}

/// Handle + knot from (possibly) different makers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub handle: Part,
    pub knot: Part,
}

impl Composite {
    pub fn handle_maker(&self) -> &str {
        &self.handle.identity.brand
    }
}

/// What a mention resolved to.
///
/// `Deferred` is a fully resolved composite whose single top-level
/// brand/model is left to the reporting stage's display policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Matched {
    Simple(Identity),
    Deferred(Composite),
    Unresolved,
}

impl Matched {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Matched::Simple(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn composite(&self) -> Option<&Composite> {
        match self {
            Matched::Deferred(composite) => Some(composite),
            _ => None,
        }
    }

    /// Top-level brand. `None` for both unresolved and deferred results.
    pub fn brand(&self) -> Option<&str> {
        self.identity().map(|i| i.brand.as_str())
    }

    pub fn model(&self) -> Option<&str> {
        self.identity().map(|i| i.model.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Matched::Unresolved)
    }
}

// Downstream consumers read `matched` as a record: null, `{brand, model, ..}`,
// or `{brand: null, model: null, handle_maker, handle, knot}`.
impl Serialize for Matched {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Matched::Unresolved => serializer.serialize_none(),
            Matched::Simple(identity) => identity.serialize(serializer),
            Matched::Deferred(composite) => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("brand", &Option::<String>::None)?;
                map.serialize_entry("model", &Option::<String>::None)?;
                map.serialize_entry("handle_maker", composite.handle_maker())?;
                map.serialize_entry("handle", &composite.handle)?;
                map.serialize_entry("knot", &composite.knot)?;
                map.end()
            }
        }
    }
}

#[derive(Deserialize)]
struct MatchedRepr {
    brand: Option<String>,
    model: Option<String>,
    handle: Option<Part>,
    knot: Option<Part>,
    #[serde(flatten)]
    rest: Metadata,
}

impl<'de> Deserialize<'de> for Matched {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let Some(mut repr) = Option::<MatchedRepr>::deserialize(deserializer)? else {
            return Ok(Matched::Unresolved);
        };
        match (repr.brand, repr.model, repr.handle, repr.knot) {
            (None, None, Some(handle), Some(knot)) => Ok(Matched::Deferred(Composite { handle, knot })),
            (Some(brand), Some(model), None, None) => {
                repr.rest.remove("handle_maker");
                Ok(Matched::Simple(Identity { brand, model, metadata: repr.rest }))
            }
            _ => Err(de::Error::custom("matched must be null, {brand, model}, or a handle/knot composite")),
        }
    }
}

// --- Match outcome -------------------------------------------------------------

/// Which tier decided a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    #[serde(alias = "regex")]
    Pattern,
    #[serde(alias = "levenshtein")]
    Fuzzy,
    Multiple,
    None,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Pattern => "pattern",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Multiple => "multiple",
            MatchType::None => "none",
        }
    }

    /// Confidence rank of a resolving tier; 0 for non-resolving outcomes.
    pub fn strength(self) -> u8 {
        match self {
            MatchType::Exact => 3,
            MatchType::Pattern => 2,
            MatchType::Fuzzy => 1,
            MatchType::Multiple | MatchType::None => 0,
        }
    }

    /// The less confident of two resolving tiers.
    pub fn weaker(self, other: MatchType) -> MatchType {
        if other.strength() < self.strength() { other } else { self }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a result: which tier, and which pattern/candidate inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Source {
    CorrectMatch {
        section: Section,
    },
    Pattern {
        section: Section,
        pattern: String,
        priority: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tie_break: Option<String>,
    },
    Fuzzy {
        section: Section,
        candidate: String,
        distance: f64,
    },
    Ambiguous {
        section: Section,
        candidates: Vec<String>,
    },
    Composite {
        signal: String,
    },
    Unmatched,
    Empty,
}

/// Output of resolving one mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub original: String,
    pub normalized: String,
    pub matched: Matched,
    pub match_type: MatchType,
    pub source: Source,
}

/// Raw product text extracted from one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub record_id: String,
    pub category: Category,
    pub text: String,
}

impl Mention {
    pub fn new(record_id: impl Into<String>, category: Category, text: impl Into<String>) -> Self {
        Mention { record_id: record_id.into(), category, text: text.into() }
    }
}
