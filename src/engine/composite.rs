//! Brush resolution: whole brushes and handle/knot composites.
//!
//! A brush mention may name one product ("Simpson Chubby 2") or a handle from
//! one maker fitted with a knot from another ("DG B15 w/ C&H Zebra"). The
//! second kind resolves to `Matched::Deferred`: both parts are identified and
//! the single top-level brand/model is left to the reporting stage.
//!
//! ## Resolution order
//!
//! ```text
//! (1) exact         brush key            -> Simple
//!                   handle + knot key    -> Deferred
//!                   handle or knot key   -> Simple (the part)
//! (2) split         delimiter found, both sides resolve as handle/knot
//!                                        -> Deferred (or multiple)
//! (3) pattern       brush catalog        -> Simple (or multiple)
//! (4) co-occurrence handle and knot patterns in disjoint spans
//!                                        -> Deferred
//! (5) knot fallback knot catalog         -> Simple (the knot)
//! (6) fuzzy         brush catalog        -> Simple
//! ```
//!
//! Steps (4) and (5) can be switched off in `CompositeConfig`.
//!
//! ## Orientation ranking
//!
//! A split "A <delim> B" is tried both ways (A handle / B knot, and the
//! reverse). Viable orientations are ranked by:
//!
//! 1. the weaker part tier, then the summed part tiers;
//! 2. agreement with explicit `handle` / `knot` words on each side;
//! 3. for ` in `, the "knot in handle" reading.
//!
//! Orientations that are still tied and name different parts give `multiple`.

use super::compiled_catalog::{CompiledCatalog, PatternHit};
use super::metrics::{Tier, TierOutcome, Tracer};
use super::pattern::{PatternOutcome, rank_hits};
use super::resolve::{Subject, Tables, TierHit, exact_part, exact_tier, fuzzy_tier, pattern_tier};
use super::trigger::{CompositeSignals, Hint, SignalMask, Split, side_hint};
use crate::normalize::normalize;
use crate::{Category, Composite, MatchResult, MatchType, Part, Section, Source};
use std::cmp::Reverse;
use std::time::Instant;
use tracing::debug;

/// Resolve a non-empty brush mention.
pub(crate) fn resolve_brush(tables: &Tables<'_>, subject: Subject<'_>, tracer: &mut Tracer) -> MatchResult {
    tier!(exact_tier(tables, Category::Brush, subject, tracer));

    let signals = CompositeSignals::scan(subject.original);
    if signals.has_delimiter() {
        tier!(split_tier(tables, subject, &signals, tracer));
    }

    tier!(pattern_tier(tables, Section::Brush, subject.original, None, tracer).map(|hit| hit.into_result(subject)));

    if tables.config.composite.co_occurrence {
        tier!(co_occurrence_tier(tables, subject, tracer));
    }
    if tables.config.composite.knot_only_fallback {
        tier!(knot_fallback_tier(tables, subject, tracer));
    }

    tier!(fuzzy_tier(tables, Section::Brush, subject.normalized, tracer).map(|hit| hit.into_result(subject)));

    debug!(normalized = %subject.normalized, "no brush match");
    MatchResult::unmatched(subject)
}

// --- Parts -------------------------------------------------------------------------

/// Resolve one side of a split as a handle or a knot: exact, pattern, fuzzy.
///
/// The words "handle" and "knot" are dropped from the key used by the exact
/// and fuzzy tiers; patterns still see the side as written.
fn resolve_part(tables: &Tables<'_>, section: Section, text: &str, tracer: &mut Tracer) -> Option<Part> {
    let key = normalize(&regex!(r"(?i)\b(?:handle|knot)\b").replace_all(text, " "));
    if key.is_empty() {
        return None;
    }

    if let Some(hit) = exact_part(tables, section, &key, tracer) {
        return hit.into_part(text);
    }
    if let Some(hit) = pattern_tier(tables, section, text, None, tracer) {
        return hit.into_part(text);
    }
    fuzzy_tier(tables, section, &key, tracer).and_then(|hit| hit.into_part(text))
}

// --- Split tier ----------------------------------------------------------------------

struct Orientation {
    delimiter: SignalMask,
    composite: Composite,
    rank: (u8, u8, i8, u8),
}

fn hint_score(side: &str, role: Hint) -> i8 {
    match side_hint(side) {
        Some(hint) if hint == role => 1,
        Some(_) => -1,
        None => 0,
    }
}

fn orientation(
    tables: &Tables<'_>,
    split: &Split,
    handle_text: &str,
    knot_text: &str,
    knot_first: bool,
    tracer: &mut Tracer,
) -> Option<Orientation> {
    let handle = resolve_part(tables, Section::Handle, handle_text, tracer)?;
    let knot = resolve_part(tables, Section::Knot, knot_text, tracer)?;

    let weakest = handle.match_type.weaker(knot.match_type).strength();
    let total = handle.match_type.strength() + knot.match_type.strength();
    let hints = hint_score(handle_text, Hint::Handle) + hint_score(knot_text, Hint::Knot);
    let convention = u8::from(split.delimiter == SignalMask::IN && knot_first);

    Some(Orientation {
        delimiter: split.delimiter,
        composite: Composite { handle, knot },
        rank: (weakest, total, hints, convention),
    })
}

fn composite_label(composite: &Composite) -> String {
    format!("handle {} + knot {}", composite.handle.identity.label(), composite.knot.identity.label())
}

fn split_tier(
    tables: &Tables<'_>,
    subject: Subject<'_>,
    signals: &CompositeSignals,
    tracer: &mut Tracer,
) -> Option<MatchResult> {
    let started = Instant::now();
    let text = subject.original;

    let mut viable: Vec<Orientation> = Vec::new();
    for split in &signals.splits {
        let (left, right) = (split.left(text), split.right(text));
        viable.extend(orientation(tables, split, left, right, false, tracer));
        viable.extend(orientation(tables, split, right, left, true, tracer));
    }

    if viable.is_empty() {
        tracer.record(Tier::Split, Section::Brush, TierOutcome::Miss, started, || {
            format!("{} split candidate(s), none resolved on both sides", signals.splits.len())
        });
        return None;
    }

    // Stable sort keeps delimiter position order among equals.
    viable.sort_by_key(|o| Reverse(o.rank));
    let top = viable[0].rank;
    let mut tied: Vec<Orientation> = viable.into_iter().take_while(|o| o.rank == top).collect();
    let mut labels: Vec<String> = Vec::new();
    tied.retain(|o| {
        let label = composite_label(&o.composite);
        let fresh = !labels.contains(&label);
        if fresh {
            labels.push(label);
        }
        fresh
    });

    if tied.len() > 1 {
        debug!(candidates = ?labels, "ambiguous handle/knot split");
        tracer.record(Tier::Split, Section::Brush, TierOutcome::Ambiguous, started, || labels.join(" | "));
        return Some(MatchResult::ambiguous(subject, Section::Brush, labels));
    }

    let winner = tied.remove(0);
    debug!(signal = winner.delimiter.label(), composite = %labels[0], "split composite");
    tracer.record(Tier::Split, Section::Brush, TierOutcome::Hit, started, || {
        format!("{} (split on {:?})", labels[0], winner.delimiter.label())
    });
    Some(MatchResult::deferred(subject, winner.composite, winner.delimiter.label()))
}

// --- Co-occurrence and knot fallback -----------------------------------------------

/// Handle and knot patterns matching disjoint parts of an undelimited mention,
/// e.g. "Zebra DG B15".
fn co_occurrence_tier(tables: &Tables<'_>, subject: Subject<'_>, tracer: &mut Tracer) -> Option<MatchResult> {
    let started = Instant::now();
    let text = subject.original;
    let handles = tables.catalogs.get(Section::Handle);
    let knots = tables.catalogs.get(Section::Knot);

    let unique = |outcome: PatternOutcome| match outcome {
        PatternOutcome::Unique { hit, .. } => Some(hit),
        _ => None,
    };
    let handle_hit = unique(rank_hits(handles, handles.hits(text), None));
    let knot_hit = unique(rank_hits(knots, knots.hits(text), None));

    let (Some(handle_hit), Some(knot_hit)) = (handle_hit, knot_hit) else {
        tracer.record(Tier::CoOccurrence, Section::Brush, TierOutcome::Miss, started, String::new);
        return None;
    };
    if handle_hit.span.start < knot_hit.span.end && knot_hit.span.start < handle_hit.span.end {
        tracer.record(Tier::CoOccurrence, Section::Brush, TierOutcome::Miss, started, || {
            format!("overlapping spans {:?} and {:?}", handle_hit.span, knot_hit.span)
        });
        return None;
    }

    let part = |catalog: &CompiledCatalog, hit: &PatternHit| {
        let entry = catalog.entry(hit.entry);
        Part {
            identity: entry.identity(),
            source_text: text[hit.span.clone()].to_string(),
            match_type: MatchType::Pattern,
            source: Source::Pattern {
                section: catalog.section(),
                pattern: catalog.pattern_source(hit.pattern).to_string(),
                priority: entry.priority,
                tie_break: None,
            },
        }
    };
    let composite = Composite { handle: part(handles, &handle_hit), knot: part(knots, &knot_hit) };

    debug!(composite = %composite_label(&composite), "co-occurring handle and knot");
    tracer.record(Tier::CoOccurrence, Section::Brush, TierOutcome::Hit, started, || composite_label(&composite));
    Some(MatchResult::deferred(subject, composite, "co_occurrence"))
}

/// A mention naming only a knot ("Declaration B15") resolves to the knot.
fn knot_fallback_tier(tables: &Tables<'_>, subject: Subject<'_>, tracer: &mut Tracer) -> Option<MatchResult> {
    let started = Instant::now();
    let hit = pattern_tier(tables, Section::Knot, subject.original, None, tracer);
    let outcome = match &hit {
        Some(TierHit::Resolved { .. }) => TierOutcome::Hit,
        Some(TierHit::Ambiguous { .. }) => TierOutcome::Ambiguous,
        None => TierOutcome::Miss,
    };
    tracer.record(Tier::KnotFallback, Section::Knot, outcome, started, String::new);
    hit.map(|hit| hit.into_result(subject))
}
