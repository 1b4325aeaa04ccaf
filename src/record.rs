//! Record batches: the input/output shape of the `batch` command.
//!
//! A record is one community post with up to four product fields. Enrichment
//! resolves each field and attaches the results without touching the
//! original fields:
//!
//! ```text
//! { "id": "abc", "razor": "Karve CB", "blade": "Feather", "score": 12 }
//!   ──▶ { "id": "abc", "razor": "Karve CB", ..., "score": 12,
//!         "matches": { "razor": {MatchResult}, "blade": {MatchResult} } }
//! ```
//!
//! Within a record the razor is resolved first: its `format` attribute is the
//! [`Context`] for the blade. Records are independent of each other and are
//! resolved in parallel; output order always equals input order.

use crate::api::{Context, Resolver};
use crate::{Category, MatchResult, MatchType, Matched, Mention};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Output field holding the resolved results of a record.
pub const MATCHES_FIELD: &str = "matches";

#[derive(Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Seconds(i64),
    FractionalSeconds(f64),
    Rfc3339(DateTime<Utc>),
}

/// Accept epoch seconds (integer or float) or an RFC 3339 string.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<Timestamp>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = match raw {
        Timestamp::Seconds(secs) => DateTime::from_timestamp(secs, 0),
        Timestamp::FractionalSeconds(secs) => DateTime::from_timestamp(secs.trunc() as i64, 0),
        Timestamp::Rfc3339(at) => Some(at),
    };
    parsed.map(Some).ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
}

/// One input record. Unknown fields are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brush: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soap: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn field(&self, category: Category) -> Option<&str> {
        match category {
            Category::Razor => self.razor.as_deref(),
            Category::Blade => self.blade.as_deref(),
            Category::Brush => self.brush.as_deref(),
            Category::Soap => self.soap.as_deref(),
        }
    }

    /// Product mentions present on this record, in category order.
    pub fn mentions(&self) -> Vec<Mention> {
        Category::ALL
            .iter()
            .filter_map(|&category| self.field(category).map(|text| Mention::new(self.id.clone(), category, text)))
            .collect()
    }
}

/// A record plus one [`MatchResult`] per present product field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub matches: BTreeMap<Category, MatchResult>,
}

impl EnrichedRecord {
    pub fn get(&self, category: Category) -> Option<&MatchResult> {
        self.matches.get(&category)
    }
}

/// Resolve every product field of `record`.
///
/// An input field named `matches` is dropped; the resolved results take its
/// place in the output.
pub fn resolve_record(resolver: &Resolver, record: &Record) -> EnrichedRecord {
    let mut matches = BTreeMap::new();
    let mut context = Context::default();

    for category in Category::ALL {
        let Some(text) = record.field(category) else {
            continue;
        };
        let result = resolver.resolve_with(category, text, &context);
        if category == Category::Razor {
            context.razor_format = result.matched.identity().and_then(|i| i.format()).map(str::to_string);
        }
        matches.insert(category, result);
    }

    let mut record = record.clone();
    if record.extra.remove(MATCHES_FIELD).is_some() {
        warn!(id = %record.id, "input field 'matches' replaced by resolved results");
    }
    EnrichedRecord { record, matches }
}

/// Resolve a batch in parallel; the output is in input order.
pub fn resolve_records(resolver: &Resolver, records: &[Record]) -> Vec<EnrichedRecord> {
    records.par_iter().map(|record| resolve_record(resolver, record)).collect()
}

// --- Summary -------------------------------------------------------------------------

/// Outcome counts for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub exact: usize,
    pub pattern: usize,
    pub fuzzy: usize,
    pub multiple: usize,
    pub none: usize,
    /// Resolved results that are handle/knot composites (also counted by tier).
    pub deferred: usize,
}

impl CategoryCounts {
    fn add(&mut self, result: &MatchResult) {
        match result.match_type {
            MatchType::Exact => self.exact += 1,
            MatchType::Pattern => self.pattern += 1,
            MatchType::Fuzzy => self.fuzzy += 1,
            MatchType::Multiple => self.multiple += 1,
            MatchType::None => self.none += 1,
        }
        if matches!(result.matched, Matched::Deferred(_)) {
            self.deferred += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.exact + self.pattern + self.fuzzy + self.multiple + self.none
    }

    pub fn resolved(&self) -> usize {
        self.exact + self.pattern + self.fuzzy
    }
}

/// Per-category outcome counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub records: usize,
    pub categories: BTreeMap<Category, CategoryCounts>,
}

impl BatchSummary {
    pub fn from_records(records: &[EnrichedRecord]) -> Self {
        let mut summary = BatchSummary { records: records.len(), ..BatchSummary::default() };
        for record in records {
            for (category, result) in &record.matches {
                summary.categories.entry(*category).or_default().add(result);
            }
        }
        summary
    }

    /// Emit one `info` line per category.
    pub fn log(&self) {
        info!(records = self.records, "batch resolved");
        for (category, counts) in &self.categories {
            info!(
                category = %category,
                total = counts.total(),
                exact = counts.exact,
                pattern = counts.pattern,
                fuzzy = counts.fuzzy,
                multiple = counts.multiple,
                none = counts.none,
                deferred = counts.deferred,
                "category summary"
            );
        }
    }
}
