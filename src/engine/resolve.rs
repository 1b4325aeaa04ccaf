//! Tier orchestration and result assembly.
//!
//! Every [`MatchResult`] is built here, through constructors that keep the
//! result shape consistent with its `match_type`:
//!
//! ```text
//! empty / unmatched  -> Unresolved, none
//! resolved           -> Simple(identity), exact | pattern | fuzzy
//! curated part       -> Simple(handle or knot), exact
//! ambiguous          -> Unresolved, multiple, source = ambiguous{candidates}
//! deferred           -> Deferred(handle + knot), weaker of the two part tiers
//! curated composite  -> Deferred(handle + knot), exact
//! ```
//!
//! The tier functions (`exact_tier`, `pattern_tier`, `fuzzy_tier`) are shared
//! with the composite resolver, which runs them per section and per side of a
//! split mention.

use super::compiled_catalog::CompiledCatalogs;
use super::composite;
use super::fuzzy::{FuzzyOutcome, best_match};
use super::metrics::{Tier, TierOutcome, Tracer};
use super::pattern::{PatternOutcome, match_patterns};
use crate::catalog::{CorrectMatchEntry, CorrectMatchIndex};
use crate::config::ResolverConfig;
use crate::normalize::normalize;
use crate::{Category, Composite, Context, Identity, MatchResult, MatchType, Matched, Part, Section, Source};
use std::time::Instant;
use tracing::debug;

/// Everything a resolution reads. Borrowed from the `Resolver`.
#[derive(Clone, Copy)]
pub(crate) struct Tables<'a> {
    pub catalogs: &'a CompiledCatalogs,
    pub index: &'a CorrectMatchIndex,
    pub config: &'a ResolverConfig,
}

/// The mention being resolved, raw and normalized.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Subject<'t> {
    pub original: &'t str,
    pub normalized: &'t str,
}

// --- Result assembly -----------------------------------------------------------

impl MatchResult {
    fn build(subject: Subject<'_>, matched: Matched, match_type: MatchType, source: Source) -> Self {
        MatchResult {
            original: subject.original.to_string(),
            normalized: subject.normalized.to_string(),
            matched,
            match_type,
            source,
        }
    }

    pub(crate) fn empty(original: &str) -> Self {
        Self::build(Subject { original, normalized: "" }, Matched::Unresolved, MatchType::None, Source::Empty)
    }

    pub(crate) fn unmatched(subject: Subject<'_>) -> Self {
        Self::build(subject, Matched::Unresolved, MatchType::None, Source::Unmatched)
    }

    pub(crate) fn ambiguous(subject: Subject<'_>, section: Section, candidates: Vec<String>) -> Self {
        Self::build(subject, Matched::Unresolved, MatchType::Multiple, Source::Ambiguous { section, candidates })
    }

    pub(crate) fn resolved(subject: Subject<'_>, identity: Identity, match_type: MatchType, source: Source) -> Self {
        debug_assert!(match_type.strength() > 0, "resolved results need a resolving tier");
        Self::build(subject, Matched::Simple(identity), match_type, source)
    }

    /// A handle/knot composite assembled by a tier; its tier is the weaker of
    /// the two parts, and never `exact` (only a curated whole-mention key is).
    pub(crate) fn deferred(subject: Subject<'_>, composite: Composite, signal: &str) -> Self {
        let match_type = composite.handle.match_type.weaker(composite.knot.match_type).weaker(MatchType::Pattern);
        Self::build(subject, Matched::Deferred(composite), match_type, Source::Composite { signal: signal.to_string() })
    }

    /// A composite curated for the whole mention.
    fn curated_composite(subject: Subject<'_>, composite: Composite) -> Self {
        let source = Source::Composite { signal: "correct_match".to_string() };
        Self::build(subject, Matched::Deferred(composite), MatchType::Exact, source)
    }
}

// --- Tier outcomes -----------------------------------------------------------------

/// A tier that produced an outcome.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TierHit {
    Resolved { identity: Identity, match_type: MatchType, source: Source },
    Ambiguous { section: Section, candidates: Vec<String> },
}

impl TierHit {
    pub fn into_result(self, subject: Subject<'_>) -> MatchResult {
        match self {
            TierHit::Resolved { identity, match_type, source } => {
                MatchResult::resolved(subject, identity, match_type, source)
            }
            TierHit::Ambiguous { section, candidates } => MatchResult::ambiguous(subject, section, candidates),
        }
    }

    /// Resolved hits become composite parts; an ambiguous part is no part.
    pub fn into_part(self, source_text: &str) -> Option<Part> {
        match self {
            TierHit::Resolved { identity, match_type, source } => {
                Some(Part { identity, source_text: source_text.to_string(), match_type, source })
            }
            TierHit::Ambiguous { .. } => None,
        }
    }
}

/// Fill attributes the curated identity leaves unset from its catalog entry.
fn enrich(tables: &Tables<'_>, section: Section, mut identity: Identity) -> Identity {
    if let Some(entry) = tables.catalogs.get(section).catalog().find(&identity.brand, &identity.model) {
        for (name, value) in &entry.metadata {
            identity.metadata.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
    identity
}

/// Curated part for `section` (handle or knot), built from an exact key.
pub(crate) fn exact_part(tables: &Tables<'_>, section: Section, key: &str, tracer: &mut Tracer) -> Option<TierHit> {
    let started = Instant::now();
    let found = tables.index.lookup_part(section, key).cloned();
    let outcome = if found.is_some() { TierOutcome::Hit } else { TierOutcome::Miss };
    tracer.record(Tier::Exact, section, outcome, started, || format!("key {key:?}"));

    let identity = enrich(tables, section, found?);
    Some(TierHit::Resolved { identity, match_type: MatchType::Exact, source: Source::CorrectMatch { section } })
}

/// Exact tier for a whole mention. Composite and part entries only exist for
/// brushes.
pub(crate) fn exact_tier(
    tables: &Tables<'_>,
    category: Category,
    subject: Subject<'_>,
    tracer: &mut Tracer,
) -> Option<MatchResult> {
    let started = Instant::now();
    let section = category.section();
    let entry = tables.index.lookup(category, subject.normalized);
    let outcome = if entry.is_some() { TierOutcome::Hit } else { TierOutcome::Miss };
    tracer.record(Tier::Exact, section, outcome, started, || format!("key {:?}", subject.normalized));

    match entry? {
        CorrectMatchEntry::Simple(identity) => {
            debug!(category = %category, brand = %identity.brand, model = %identity.model, "exact match");
            let identity = enrich(tables, section, identity);
            Some(MatchResult::resolved(subject, identity, MatchType::Exact, Source::CorrectMatch { section }))
        }
        CorrectMatchEntry::Composite { handle, knot } => {
            debug!(handle = %handle.label(), knot = %knot.label(), "exact composite match");
            let part = |section: Section, identity: Identity| Part {
                identity: enrich(tables, section, identity),
                source_text: subject.original.to_string(),
                match_type: MatchType::Exact,
                source: Source::CorrectMatch { section },
            };
            let composite = Composite { handle: part(Section::Handle, handle), knot: part(Section::Knot, knot) };
            Some(MatchResult::curated_composite(subject, composite))
        }
        CorrectMatchEntry::Part { section, identity } => {
            debug!(section = %section, part = %identity.label(), "exact part match");
            let identity = enrich(tables, section, identity);
            Some(MatchResult::resolved(subject, identity, MatchType::Exact, Source::CorrectMatch { section }))
        }
    }
}

/// Pattern tier over `section`, on the raw text.
pub(crate) fn pattern_tier(
    tables: &Tables<'_>,
    section: Section,
    text: &str,
    format: Option<&str>,
    tracer: &mut Tracer,
) -> Option<TierHit> {
    let started = Instant::now();
    let catalog = tables.catalogs.get(section);

    match match_patterns(catalog, text, format) {
        PatternOutcome::Unique { hit, tie_break } => {
            let entry = catalog.entry(hit.entry);
            let pattern = catalog.pattern_source(hit.pattern).to_string();
            debug!(section = %section, entry = %entry.label(), pattern = %pattern, "pattern match");
            tracer.record(Tier::Pattern, section, TierOutcome::Hit, started, || match &tie_break {
                Some(rule) => format!("{} via {pattern:?} ({rule})", entry.label()),
                None => format!("{} via {pattern:?}", entry.label()),
            });
            let source = Source::Pattern { section, pattern, priority: entry.priority, tie_break };
            Some(TierHit::Resolved { identity: entry.identity(), match_type: MatchType::Pattern, source })
        }
        PatternOutcome::Ambiguous(entries) => {
            let candidates: Vec<String> = entries.iter().map(|&e| catalog.entry(e).label()).collect();
            debug!(section = %section, candidates = ?candidates, "ambiguous pattern match");
            tracer.record(Tier::Pattern, section, TierOutcome::Ambiguous, started, || candidates.join(" | "));
            Some(TierHit::Ambiguous { section, candidates })
        }
        PatternOutcome::NoMatch => {
            tracer.record(Tier::Pattern, section, TierOutcome::Miss, started, String::new);
            None
        }
    }
}

/// Fuzzy tier over `section`, on the normalized text.
pub(crate) fn fuzzy_tier(
    tables: &Tables<'_>,
    section: Section,
    normalized: &str,
    tracer: &mut Tracer,
) -> Option<TierHit> {
    let started = Instant::now();
    let catalog = tables.catalogs.get(section);

    match best_match(catalog, normalized, &tables.config.fuzzy) {
        FuzzyOutcome::Unique { entry, distance } => {
            let entry = catalog.entry(entry);
            debug!(section = %section, entry = %entry.label(), distance, "fuzzy match");
            tracer.record(Tier::Fuzzy, section, TierOutcome::Hit, started, || {
                format!("{} at distance {distance}", entry.label())
            });
            let source = Source::Fuzzy { section, candidate: entry.label(), distance };
            Some(TierHit::Resolved { identity: entry.identity(), match_type: MatchType::Fuzzy, source })
        }
        FuzzyOutcome::Tied(entries) => {
            let names: Vec<String> = entries.iter().map(|&e| catalog.entry(e).label()).collect();
            debug!(section = %section, tied = ?names, "fuzzy tie, rejecting");
            tracer.record(Tier::Fuzzy, section, TierOutcome::Miss, started, || format!("tied: {}", names.join(" | ")));
            None
        }
        FuzzyOutcome::NoMatch => {
            tracer.record(Tier::Fuzzy, section, TierOutcome::Miss, started, String::new);
            None
        }
        FuzzyOutcome::Skipped => {
            tracer.record(Tier::Fuzzy, section, TierOutcome::Skipped, started, String::new);
            None
        }
    }
}

// --- Orchestration ---------------------------------------------------------------

/// Resolve one mention of `category`.
///
/// ```text
/// normalize ─┬─ "" ──────────────────────────────▶ none (empty)
///            ├─ brush ─▶ composite::resolve_brush
///            └─ exact ─▶ pattern ─▶ fuzzy ─▶ none (unmatched)
/// ```
pub(crate) fn resolve_text(
    tables: &Tables<'_>,
    category: Category,
    text: &str,
    context: &Context,
    tracer: &mut Tracer,
) -> MatchResult {
    let started = Instant::now();
    let normalized = normalize(text);
    tracer.normalized(started.elapsed());

    if normalized.is_empty() {
        debug!(category = %category, "empty mention");
        return MatchResult::empty(text);
    }

    let subject = Subject { original: text, normalized: &normalized };
    if category.supports_composites() {
        return composite::resolve_brush(tables, subject, tracer);
    }

    let section = category.section();
    let format = match category {
        Category::Blade => context.razor_format.as_deref(),
        _ => None,
    };

    tier!(exact_tier(tables, category, subject, tracer));
    tier!(pattern_tier(tables, section, text, format, tracer).map(|hit| hit.into_result(subject)));
    tier!(fuzzy_tier(tables, section, &normalized, tracer).map(|hit| hit.into_result(subject)));

    debug!(category = %category, normalized = %normalized, "no match");
    MatchResult::unmatched(subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::{AttrValue, Catalog};

    #[test]
    fn deferred_takes_the_weaker_part_tier() {
        let subject = Subject { original: "Zebra w/ B15", normalized: "zebra w/ b15" };
        let part = |brand: &str, match_type: MatchType| Part {
            identity: Identity::new(brand, "X"),
            source_text: brand.to_string(),
            match_type,
            source: Source::Unmatched,
        };
        let composite = Composite { handle: part("Chisel & Hound", MatchType::Exact), knot: part("DG", MatchType::Fuzzy) };
        let result = MatchResult::deferred(subject, composite, "w/");

        assert_eq!(result.match_type, MatchType::Fuzzy);
        assert_eq!(result.source, Source::Composite { signal: "w/".into() });
        assert_eq!(result.matched.brand(), None);

        // Two curated parts do not make the whole mention curated.
        let composite = Composite { handle: part("Chisel & Hound", MatchType::Exact), knot: part("DG", MatchType::Exact) };
        assert_eq!(MatchResult::deferred(subject, composite, "w/").match_type, MatchType::Pattern);
    }

    #[test]
    fn empty_result_shape() {
        let result = MatchResult::empty("   ");
        assert_eq!(result.original, "   ");
        assert_eq!(result.normalized, "");
        assert_eq!(result.match_type, MatchType::None);
        assert_eq!(result.matched, Matched::Unresolved);
        assert_eq!(result.source, Source::Empty);
    }

    #[test]
    fn exact_identities_are_enriched_from_the_catalog() {
        let mut store = CatalogStore::default();
        let yaml = "Karve:\n  Christopher Bradley:\n    patterns: ['karve']\n    format: DE\n    plate: C\n";
        store.insert(Catalog::from_yaml_str(Section::Razor, "razors.yaml", yaml).unwrap());
        let catalogs = CompiledCatalogs::new(&store).unwrap();
        let index = CorrectMatchIndex::from_yaml_str(
            "correct_matches.yaml",
            "razor:\n  Karve:\n    Christopher Bradley:\n      plate: G\n      strings: [karve cb]\n",
        )
        .unwrap();
        let config = ResolverConfig::default();
        let tables = Tables { catalogs: &catalogs, index: &index, config: &config };

        let subject = Subject { original: "Karve CB", normalized: "karve cb" };
        let result = exact_tier(&tables, Category::Razor, subject, &mut Tracer::disabled()).unwrap();
        let identity = result.matched.identity().unwrap();

        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(identity.format(), Some("DE"));
        // The curated value wins over the catalog's.
        assert_eq!(identity.attr("plate"), Some(&AttrValue::Text("G".into())));
    }
}
