//! Pattern tier: ranking of catalog pattern hits.
//!
//! `CompiledCatalog::hits` reports, per entry, the first of its patterns that
//! matches the raw mention. This module decides which hit (if any) wins.
//!
//! ## Ranking
//!
//! ```text
//! hits ── sort by (priority desc, specificity desc, ordinal asc)
//!      ── top rank shared by one entry   -> Unique
//!      ── shared by several entries      -> format tie-break (blades)
//!                                        -> Ambiguous
//! ```
//!
//! Specificity is the character length of the matching pattern. Declaration
//! order is only used to keep the ambiguous candidate list stable,
//! never to pick a winner.

use super::compiled_catalog::{CompiledCatalog, PatternHit};
use crate::AttrValue;
use std::cmp::Reverse;

/// Result of ranking pattern hits.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PatternOutcome {
    Unique {
        hit: PatternHit,
        /// Set when a format hint picked `hit` among tied candidates.
        tie_break: Option<String>,
    },
    /// Entry indices sharing the top rank, in declaration order.
    Ambiguous(Vec<usize>),
    NoMatch,
}

fn rank_key(catalog: &CompiledCatalog, hit: &PatternHit) -> (i32, usize) {
    let priority = catalog.entry(hit.entry).priority;
    let specificity = catalog.pattern_source(hit.pattern).chars().count();
    (priority, specificity)
}

/// Rank `hits` of `catalog`.
///
/// `format` is the razor format of the surrounding record (e.g. `GEM`); it
/// only ever narrows a tie, never overrides a strictly better candidate.
pub(crate) fn rank_hits(catalog: &CompiledCatalog, mut hits: Vec<PatternHit>, format: Option<&str>) -> PatternOutcome {
    if hits.is_empty() {
        return PatternOutcome::NoMatch;
    }

    hits.sort_by_key(|h| (Reverse(rank_key(catalog, h)), catalog.entry(h.entry).ordinal));
    let top = rank_key(catalog, &hits[0]);
    hits.retain(|h| rank_key(catalog, h) == top);

    if hits.len() == 1 {
        return PatternOutcome::Unique { hit: hits.remove(0), tie_break: None };
    }

    if let Some(format) = format {
        let mut same_format = hits.iter().filter(|h| {
            let entry_format = catalog.entry(h.entry).metadata.get("format").and_then(AttrValue::as_str);
            entry_format.is_some_and(|f| f.eq_ignore_ascii_case(format))
        });
        if let (Some(only), None) = (same_format.next(), same_format.next()) {
            return PatternOutcome::Unique { hit: only.clone(), tie_break: Some(format!("format={format}")) };
        }
    }

    PatternOutcome::Ambiguous(hits.into_iter().map(|h| h.entry).collect())
}

/// Run the pattern tier of `catalog` over `text`.
pub(crate) fn match_patterns(catalog: &CompiledCatalog, text: &str, format: Option<&str>) -> PatternOutcome {
    rank_hits(catalog, catalog.hits(text), format)
}
