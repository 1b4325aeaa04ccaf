//! Pattern compilation and indexing.
//!
//! This module holds the *static* side of the engine: structures derived once
//! from the catalog store that make every resolution cheap and predictable.
//!
//! Resolution is split into two phases:
//!
//! 1. **Compile** (this module): build one `Regex` per catalog pattern plus a
//!    `RegexSet` over all patterns of a section.
//! 2. **Run** (see `pattern.rs`): ask the set which patterns match, then use
//!    the individual regexes only for those hits to recover spans.
//!
//! ## Invariants
//!
//! - `owners[i]` and `regexes[i]` describe set index `i`; the three vectors are
//!   built together and stay aligned.
//! - Set indices follow declaration order (entry ordinal, then pattern order),
//!   so the first hit of an entry is its first matching pattern.
//! - All patterns are case-insensitive.

use crate::catalog::{Catalog, CatalogEntry, CatalogStore};
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::Section;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use std::ops::Range;

// --- Pattern compilation -----------------------------------------------------

/// Index into a section's flattened pattern list.
pub(crate) type PatternId = usize;

/// One pattern matched against a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternHit {
    /// Index of the owning entry in `CompiledCatalog::entries`.
    pub entry: usize,
    pub pattern: PatternId,
    /// Byte span of the leftmost match in the raw mention.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy)]
struct PatternOwner {
    entry: usize,
    /// Position of the pattern inside its entry's list.
    position: usize,
}

/// A section catalog with compiled patterns.
#[derive(Debug)]
pub(crate) struct CompiledCatalog {
    catalog: Catalog,
    set: RegexSet,
    regexes: Vec<Regex>,
    owners: Vec<PatternOwner>,
    /// `normalize("{brand} {model}")` per entry, for the fuzzy tier.
    canonical: Vec<String>,
}

impl CompiledCatalog {
    pub fn new(catalog: &Catalog) -> Result<Self> {
        let section = catalog.section();
        let mut sources = Vec::new();
        let mut regexes = Vec::new();
        let mut owners = Vec::new();

        for (entry_idx, entry) in catalog.entries().iter().enumerate() {
            for (position, pattern) in entry.patterns.iter().enumerate() {
                let regex = RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|source| {
                    Error::Pattern {
                        section,
                        brand: entry.brand.clone(),
                        model: entry.model.clone(),
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                sources.push(pattern.as_str());
                regexes.push(regex);
                owners.push(PatternOwner { entry: entry_idx, position });
            }
        }

        let set = RegexSetBuilder::new(&sources)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::schema(section.file_name(), format!("cannot build pattern set: {e}")))?;

        let canonical = catalog.entries().iter().map(|e| normalize(&e.label())).collect();

        Ok(CompiledCatalog { catalog: catalog.clone(), set, regexes, owners, canonical })
    }

    pub fn section(&self) -> Section {
        self.catalog.section()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn entry(&self, idx: usize) -> &CatalogEntry {
        &self.catalog.entries()[idx]
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = (usize, &str)> {
        self.canonical.iter().map(String::as_str).enumerate()
    }

    /// Source text of a compiled pattern.
    pub fn pattern_source(&self, id: PatternId) -> &str {
        let owner = self.owners[id];
        &self.entry(owner.entry).patterns[owner.position]
    }

    /// First matching pattern of every entry that matches `text`, in
    /// declaration order.
    pub fn hits(&self, text: &str) -> Vec<PatternHit> {
        let mut hits: Vec<PatternHit> = Vec::new();
        for id in self.set.matches(text).iter() {
            let owner = self.owners[id];
            if hits.last().is_some_and(|h| h.entry == owner.entry) {
                continue;
            }
            // The set guarantees a match; `find` only recovers the span.
            if let Some(m) = self.regexes[id].find(text) {
                hits.push(PatternHit { entry: owner.entry, pattern: id, span: m.start()..m.end() });
            }
        }
        hits
    }
}

/// Compiled catalogs for every section.
#[derive(Debug)]
pub(crate) struct CompiledCatalogs {
    by_section: Vec<CompiledCatalog>,
}

impl CompiledCatalogs {
    /// Compile every section; the first invalid pattern fails the whole load.
    pub fn new(store: &CatalogStore) -> Result<Self> {
        let by_section =
            Section::ALL.iter().map(|&section| CompiledCatalog::new(store.get(section))).collect::<Result<Vec<_>>>()?;
        Ok(CompiledCatalogs { by_section })
    }

    pub fn get(&self, section: Section) -> &CompiledCatalog {
        let idx = Section::ALL.iter().position(|&s| s == section).unwrap_or_default();
        &self.by_section[idx]
    }

    pub fn pattern_count(&self) -> usize {
        self.by_section.iter().map(|c| c.regexes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAZORS: &str = r#"
Karve:
  Christopher Bradley:
    patterns: ['karve.*\bcb\b', 'christopher\s*bradley']
    format: DE
Gillette:
  Tech:
    patterns: ['\btech\b']
    format: DE
"#;

    fn razors() -> CompiledCatalog {
        CompiledCatalog::new(&Catalog::from_yaml_str(Section::Razor, "razors.yaml", RAZORS).unwrap()).unwrap()
    }

    #[test]
    fn hits_report_first_matching_pattern_per_entry() {
        let compiled = razors();
        let hits = compiled.hits("Karve Christopher Bradley CB");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry, 0);
        assert_eq!(compiled.pattern_source(hits[0].pattern), r"karve.*\bcb\b");
        assert_eq!(hits[0].span, 0..28);
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let compiled = razors();
        let hits = compiled.hits("GILLETTE TECH");
        assert_eq!(hits.len(), 1);
        assert_eq!(compiled.entry(hits[0].entry).label(), "Gillette Tech");
        assert_eq!(hits[0].span, 9..13);
    }

    #[test]
    fn no_hits_on_unrelated_text() {
        assert!(razors().hits("Rockwell 6C").is_empty());
    }

    #[test]
    fn canonical_names_are_normalized() {
        let compiled = razors();
        let names: Vec<&str> = compiled.canonical_names().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["karve christopher bradley", "gillette tech"]);
    }

    #[test]
    fn invalid_pattern_names_its_owner() {
        let yaml = "Karve:\n  CB:\n    patterns: ['karve(']\n";
        let catalog = Catalog::from_yaml_str(Section::Razor, "razors.yaml", yaml).unwrap();
        let err = CompiledCatalog::new(&catalog).unwrap_err();
        match err {
            Error::Pattern { section, brand, model, pattern, .. } => {
                assert_eq!(section, Section::Razor);
                assert_eq!((brand.as_str(), model.as_str()), ("Karve", "CB"));
                assert_eq!(pattern, "karve(");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_store_compiles() {
        let compiled = CompiledCatalogs::new(&CatalogStore::default()).unwrap();
        assert_eq!(compiled.pattern_count(), 0);
        assert!(compiled.get(Section::Knot).hits("anything").is_empty());
    }
}
