use crate::catalog::{Catalog, CatalogStore, CorrectMatchIndex};
use crate::config::ResolverConfig;
use crate::engine::{self, CompiledCatalogs, RunMetrics, Tables, Tracer};
use crate::error::Result;
use crate::{Category, Matched, MatchResult, MatchType, Mention, Section};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Name of the curated exact-match file inside a catalog directory.
pub const CORRECT_MATCHES_FILE: &str = "correct_matches.yaml";

/// Resolution context.
///
/// This holds facts from the surrounding record that may narrow a decision
/// (like the razor a blade was used in).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Resolved format of the record's razor (`DE`, `GEM`, `AC`, ...); used to
    /// break blade pattern ties.
    pub razor_format: Option<String>,
}

impl Context {
    pub fn with_razor_format(format: impl Into<String>) -> Self {
        Context { razor_format: Some(format.into()) }
    }
}

/// Result from [`Resolver::resolve_verbose_with`].
///
/// Meant for debugging a single mention: every tier consulted, what it
/// concluded and how long it took.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionVerbose {
    pub result: MatchResult,
    pub metrics: RunMetrics,
}

/// A curated string that no longer resolves to its curated identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfCheckFailure {
    pub section: Section,
    pub text: String,
    pub expected: String,
    pub actual: String,
}

/// Immutable resolver over loaded catalogs and curated matches.
///
/// Built once per process and shared by reference; it is `Send + Sync`.
///
/// # Example
/// ```
/// use gearmatch::{Category, MatchType, Resolver, Section};
///
/// let resolver = Resolver::builder()
///     .section(Section::Razor, "Karve:\n  Christopher Bradley:\n    patterns: ['karve.*\\bcb\\b']\n")
///     .build()
///     .unwrap();
///
/// let result = resolver.resolve(Category::Razor, "Karve CB (brass)");
/// assert_eq!(result.match_type, MatchType::Pattern);
/// assert_eq!(result.matched.brand(), Some("Karve"));
/// ```
#[derive(Debug)]
pub struct Resolver {
    catalogs: CompiledCatalogs,
    index: CorrectMatchIndex,
    config: ResolverConfig,
}

impl Resolver {
    /// Load `<section>.yaml` files and `correct_matches.yaml` from `dir`.
    pub fn from_dir(dir: &Path, config: ResolverConfig) -> Result<Self> {
        let store = CatalogStore::from_dir(dir)?;
        let index = CorrectMatchIndex::from_file(&dir.join(CORRECT_MATCHES_FILE))?;
        Self::from_parts(&store, index, config)
    }

    /// Compile `store` and take ownership of `index`.
    pub fn from_parts(store: &CatalogStore, index: CorrectMatchIndex, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let catalogs = CompiledCatalogs::new(store)?;
        info!(patterns = catalogs.pattern_count(), curated = index.len(), "resolver ready");
        Ok(Resolver { catalogs, index, config })
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    fn tables(&self) -> Tables<'_> {
        Tables { catalogs: &self.catalogs, index: &self.index, config: &self.config }
    }

    /// Resolve `text` as a mention of `category` with an empty [`Context`].
    pub fn resolve(&self, category: Category, text: &str) -> MatchResult {
        self.resolve_with(category, text, &Context::default())
    }

    /// Resolve `text` with facts from the surrounding record.
    pub fn resolve_with(&self, category: Category, text: &str, context: &Context) -> MatchResult {
        engine::resolve_text(&self.tables(), category, text, context, &mut Tracer::disabled())
    }

    pub fn resolve_mention(&self, mention: &Mention) -> MatchResult {
        self.resolve(mention.category, &mention.text)
    }

    /// Resolve and return the per-tier trace alongside the result.
    ///
    /// The default [`resolve_with`](Self::resolve_with) path does not allocate
    /// these traces.
    pub fn resolve_verbose_with(&self, category: Category, text: &str, context: &Context) -> ResolutionVerbose {
        let mut tracer = Tracer::new(true);
        let result = engine::resolve_text(&self.tables(), category, text, context, &mut tracer);
        ResolutionVerbose { result, metrics: tracer.finish() }
    }

    /// Re-resolve every curated string and report those that no longer come
    /// back `exact` with their curated identity.
    ///
    /// Handle/knot strings are checked as brush mentions: a composite key must
    /// come back with the curated part on its side, and a part-only key must
    /// come back as that part.
    pub fn self_check(&self) -> Vec<SelfCheckFailure> {
        let mut failures = Vec::new();
        for curated in self.index.curated() {
            let (category, expected) = match curated.section {
                Section::Razor => (Category::Razor, None),
                Section::Blade => (Category::Blade, None),
                Section::Brush => (Category::Brush, None),
                Section::Soap => (Category::Soap, None),
                Section::Handle | Section::Knot => {
                    let other = if curated.section == Section::Handle { Section::Knot } else { Section::Handle };
                    let composite = self.index.lookup_part(other, &curated.key).is_some();
                    (Category::Brush, composite.then_some(curated.section))
                }
            };

            let result = self.resolve(category, &curated.text);
            let identity = match (&result.matched, expected) {
                (Matched::Simple(identity), None) => Some(identity),
                (Matched::Deferred(composite), Some(Section::Handle)) => Some(&composite.handle.identity),
                (Matched::Deferred(composite), Some(_)) => Some(&composite.knot.identity),
                _ => None,
            };
            let holds = result.match_type == MatchType::Exact
                && identity.is_some_and(|i| {
                    i.brand == curated.identity.brand
                        && i.model == curated.identity.model
                        && curated.identity.metadata.iter().all(|(k, v)| i.metadata.get(k) == Some(v))
                });

            if !holds {
                failures.push(SelfCheckFailure {
                    section: curated.section,
                    text: curated.text.clone(),
                    expected: curated.identity.label(),
                    actual: describe(&result),
                });
            }
        }
        failures
    }

    pub fn catalog(&self, section: Section) -> &Catalog {
        self.catalogs.get(section).catalog()
    }

    pub fn correct_matches(&self) -> &CorrectMatchIndex {
        &self.index
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

/// One-line summary of a result, used in self-check reports.
fn describe(result: &MatchResult) -> String {
    match &result.matched {
        Matched::Simple(identity) => format!("{} ({})", identity.label(), result.match_type),
        Matched::Deferred(composite) => format!(
            "handle {} + knot {} ({})",
            composite.handle.identity.label(),
            composite.knot.identity.label(),
            result.match_type
        ),
        Matched::Unresolved => result.match_type.to_string(),
    }
}

/// Builds a [`Resolver`] from in-memory YAML, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct ResolverBuilder {
    sections: Vec<(Section, String)>,
    correct_matches: Option<String>,
    config: ResolverConfig,
}

impl ResolverBuilder {
    /// Catalog YAML for `section`; a later call for the same section wins.
    pub fn section(mut self, section: Section, yaml: impl Into<String>) -> Self {
        self.sections.push((section, yaml.into()));
        self
    }

    pub fn correct_matches(mut self, yaml: impl Into<String>) -> Self {
        self.correct_matches = Some(yaml.into());
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Resolver> {
        let mut store = CatalogStore::default();
        for (section, yaml) in &self.sections {
            store.insert(Catalog::from_yaml_str(*section, section.file_name(), yaml)?);
        }
        let index = match &self.correct_matches {
            Some(yaml) => CorrectMatchIndex::from_yaml_str(CORRECT_MATCHES_FILE, yaml)?,
            None => CorrectMatchIndex::empty(),
        };
        Resolver::from_parts(&store, index, self.config)
    }
}
