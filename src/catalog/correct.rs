//! Correct-match index: curated exact-text overrides.
//!
//! ```yaml
//! razor:
//!   Karve:
//!     Christopher Bradley:
//!       - Karve CB
//! handle:
//!   Chisel & Hound:
//!     Zebra:
//!       - DG B15 w/ C&H Zebra
//! knot:
//!   Declaration Grooming:
//!     B15:
//!       fiber: Badger
//!       knot_size_mm: 26.0
//!       strings:
//!         - DG B15 w/ C&H Zebra
//! ```
//!
//! A composite mention is listed once under `handle` and once under `knot`;
//! the two sections are joined on the normalized key. A string listed under
//! only one of them is a curated *part* ("C&H Zebra" → handle). It is used
//! when a split brush mention is resolved side by side, and a brush mention
//! that is exactly the part resolves to the part alone.
//!
//! ## Invariants (checked at load)
//!
//! - Keys are produced by [`crate::normalize`] and are never empty.
//! - One key maps to one identity per section.
//! - A composite key (present under both `handle` and `knot`) never appears
//!   under the simple `brush` section as well.

use super::{RESERVED_ATTRS, parse_yaml};
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::{Category, Identity, Metadata, Section};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Result of an exact lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectMatchEntry {
    Simple(Identity),
    Composite { handle: Identity, knot: Identity },
    /// A brush mention naming only a curated handle or knot.
    Part { section: Section, identity: Identity },
}

/// One curated source string, kept for self-checks and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratedString {
    pub section: Section,
    pub text: String,
    pub key: String,
    pub identity: Identity,
}

#[derive(Debug, Deserialize)]
struct RawDetailed {
    strings: Vec<String>,
    #[serde(flatten)]
    metadata: Metadata,
}

#[derive(Debug, Clone, Default)]
pub struct CorrectMatchIndex {
    by_section: HashMap<Section, HashMap<String, Identity>>,
    curated: Vec<CuratedString>,
}

impl CorrectMatchIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `correct_matches.yaml`; a missing file is an empty index.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "correct matches file missing; exact tier disabled");
            return Ok(Self::empty());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let index = Self::from_yaml_str(&path.display().to_string(), &content)?;
        info!(strings = index.len(), "correct matches loaded");
        Ok(index)
    }

    pub fn from_yaml_str(origin: &str, content: &str) -> Result<Self> {
        let raw: IndexMap<String, IndexMap<String, IndexMap<String, serde_yaml::Value>>> =
            parse_yaml(origin, content)?.unwrap_or_default();

        let mut index = CorrectMatchIndex::default();
        for (section_key, brands) in raw {
            let section = Section::from_key(&section_key)
                .ok_or_else(|| Error::schema(origin, format!("unknown section '{section_key}'")))?;

            for (brand, models) in brands {
                for (model, body) in models {
                    let at = format!("{section}: {brand} / {model}");
                    let (strings, metadata) = match body {
                        serde_yaml::Value::Sequence(_) => {
                            let strings: Vec<String> = serde_yaml::from_value(body)
                                .map_err(|e| Error::schema(origin, format!("{at}: {e}")))?;
                            (strings, Metadata::new())
                        }
                        serde_yaml::Value::Mapping(_) => {
                            let detailed: RawDetailed = serde_yaml::from_value(body)
                                .map_err(|e| Error::schema(origin, format!("{at}: {e}")))?;
                            (detailed.strings, detailed.metadata)
                        }
                        _ => {
                            return Err(Error::schema(
                                origin,
                                format!("{at}: expected a list of strings or a mapping with 'strings'"),
                            ));
                        }
                    };

                    if let Some(key) = metadata.keys().find(|k| RESERVED_ATTRS.contains(&k.as_str())) {
                        return Err(Error::schema(origin, format!("{at}: '{key}' is reserved and cannot be an attribute")));
                    }

                    let identity = Identity { brand: brand.clone(), model: model.clone(), metadata };
                    for text in strings {
                        index.insert(origin, section, text, identity.clone())?;
                    }
                }
            }
        }

        index.validate_composites()?;
        Ok(index)
    }

    fn insert(&mut self, origin: &str, section: Section, text: String, identity: Identity) -> Result<()> {
        let key = normalize(&text);
        if key.is_empty() {
            return Err(Error::schema(origin, format!("{section}: {}: blank correct-match string", identity.label())));
        }

        let keys = self.by_section.entry(section).or_default();
        if let Some(existing) = keys.get(&key) {
            if existing.brand != identity.brand || existing.model != identity.model {
                return Err(Error::Conflict { section, key, first: existing.label(), second: identity.label() });
            }
            return Ok(());
        }

        keys.insert(key.clone(), identity.clone());
        self.curated.push(CuratedString { section, text, key, identity });
        Ok(())
    }

    fn validate_composites(&self) -> Result<()> {
        let knots = self.section_keys(Section::Knot);
        let simple = self.section_keys(Section::Brush);

        let handles = self.curated.iter().filter(|c| c.section == Section::Handle);
        for curated in handles.filter(|c| knots.contains_key(&c.key)) {
            if let Some(brush) = simple.get(&curated.key) {
                return Err(Error::Conflict {
                    section: Section::Brush,
                    key: curated.key.clone(),
                    first: brush.label(),
                    second: format!("composite with handle {}", curated.identity.label()),
                });
            }
        }
        Ok(())
    }

    fn section_keys(&self, section: Section) -> &HashMap<String, Identity> {
        static EMPTY: once_cell::sync::Lazy<HashMap<String, Identity>> = once_cell::sync::Lazy::new(HashMap::new);
        self.by_section.get(&section).unwrap_or(&EMPTY)
    }

    /// Exact lookup of an already-normalized key.
    ///
    /// For composite-capable categories the handle/knot sections are joined
    /// on `key`; a key present in only one of them is a part.
    pub fn lookup(&self, category: Category, key: &str) -> Option<CorrectMatchEntry> {
        if key.is_empty() {
            return None;
        }
        if let Some(identity) = self.section_keys(category.section()).get(key) {
            return Some(CorrectMatchEntry::Simple(identity.clone()));
        }
        if !category.supports_composites() {
            return None;
        }
        match (self.lookup_part(Section::Handle, key), self.lookup_part(Section::Knot, key)) {
            (Some(handle), Some(knot)) => Some(CorrectMatchEntry::Composite { handle: handle.clone(), knot: knot.clone() }),
            (Some(handle), None) => Some(CorrectMatchEntry::Part { section: Section::Handle, identity: handle.clone() }),
            (None, Some(knot)) => Some(CorrectMatchEntry::Part { section: Section::Knot, identity: knot.clone() }),
            (None, None) => None,
        }
    }

    /// Exact lookup inside a single section (used for composite sub-parts).
    pub fn lookup_part(&self, section: Section, key: &str) -> Option<&Identity> {
        if key.is_empty() {
            return None;
        }
        self.section_keys(section).get(key)
    }

    /// Every curated string, in file order.
    pub fn curated(&self) -> &[CuratedString] {
        &self.curated
    }

    pub fn len(&self) -> usize {
        self.curated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRECT: &str = r#"
razor:
  Karve:
    Christopher Bradley:
      - Karve CB
      - karve christopher bradley
brush:
  Simpson:
    Chubby 2:
      - Simpson Chubby 2
handle:
  Chisel & Hound:
    Zebra:
      - DG B15 w/ C&H Zebra
knot:
  Declaration Grooming:
    B15:
      fiber: Badger
      knot_size_mm: 26.0
      strings:
        - DG B15 w/ C&H Zebra
"#;

    #[test]
    fn simple_lookup_uses_normalized_keys() {
        let index = CorrectMatchIndex::from_yaml_str("correct_matches.yaml", CORRECT).unwrap();
        let entry = index.lookup(Category::Razor, &normalize("  KARVE cb. ")).unwrap();
        assert_eq!(entry, CorrectMatchEntry::Simple(Identity::new("Karve", "Christopher Bradley")));
    }

    #[test]
    fn lookup_is_scoped_to_the_category() {
        let index = CorrectMatchIndex::from_yaml_str("correct_matches.yaml", CORRECT).unwrap();
        assert!(index.lookup(Category::Blade, "karve cb").is_none());
        assert!(index.lookup(Category::Razor, "").is_none());
    }

    #[test]
    fn composite_lookup_joins_handle_and_knot() {
        let index = CorrectMatchIndex::from_yaml_str("correct_matches.yaml", CORRECT).unwrap();
        let Some(CorrectMatchEntry::Composite { handle, knot }) =
            index.lookup(Category::Brush, "dg b15 w/ c&h zebra")
        else {
            panic!("expected composite entry");
        };
        assert_eq!(handle.brand, "Chisel & Hound");
        assert_eq!(knot.fiber(), Some("Badger"));
        assert_eq!(knot.knot_size_mm(), Some(26.0));

        // Composite sections only apply to brushes.
        assert!(index.lookup(Category::Razor, "dg b15 w/ c&h zebra").is_none());
    }

    #[test]
    fn keeps_curated_strings_in_file_order() {
        let index = CorrectMatchIndex::from_yaml_str("correct_matches.yaml", CORRECT).unwrap();
        let texts: Vec<&str> = index.curated().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Karve CB", "karve christopher bradley", "Simpson Chubby 2", "DG B15 w/ C&H Zebra", "DG B15 w/ C&H Zebra"]
        );
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn rejects_unknown_section() {
        let err = CorrectMatchIndex::from_yaml_str("cm.yaml", "razors:\n  Karve:\n    CB: [karve]\n").unwrap_err();
        assert!(err.to_string().contains("unknown section 'razors'"));
    }

    #[test]
    fn rejects_conflicting_identities() {
        let yaml = "razor:\n  Karve:\n    CB: [karve]\n    Overlander: [Karve.]\n";
        let err = CorrectMatchIndex::from_yaml_str("cm.yaml", yaml).unwrap_err();
        assert!(matches!(err, Error::Conflict { section: Section::Razor, .. }));
    }

    #[test]
    fn duplicate_string_for_the_same_identity_is_harmless() {
        let yaml = "razor:\n  Karve:\n    CB: [karve cb, Karve CB]\n";
        let index = CorrectMatchIndex::from_yaml_str("cm.yaml", yaml).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn single_section_strings_are_parts_not_composites() {
        let yaml = "handle:\n  Chisel & Hound:\n    Zebra: [C&H Zebra]\n";
        let index = CorrectMatchIndex::from_yaml_str("cm.yaml", yaml).unwrap();
        assert_eq!(
            index.lookup(Category::Brush, "c&h zebra"),
            Some(CorrectMatchEntry::Part { section: Section::Handle, identity: Identity::new("Chisel & Hound", "Zebra") })
        );
        assert!(index.lookup(Category::Razor, "c&h zebra").is_none());
        let handle = index.lookup_part(Section::Handle, "c&h zebra").map(Identity::label);
        assert_eq!(handle.as_deref(), Some("Chisel & Hound Zebra"));
        assert!(index.lookup_part(Section::Knot, "c&h zebra").is_none());
    }

    #[test]
    fn rejects_composite_key_that_is_also_simple() {
        let yaml = r#"
brush:
  Simpson:
    Chubby 2: [simpson w/ simpson]
handle:
  Simpson:
    Chubby Handle: [simpson w/ simpson]
knot:
  Simpson:
    Best Badger: [simpson w/ simpson]
"#;
        let err = CorrectMatchIndex::from_yaml_str("cm.yaml", yaml).unwrap_err();
        assert!(matches!(err, Error::Conflict { section: Section::Brush, .. }));
    }

    #[test]
    fn rejects_scalar_model_body() {
        let yaml = "razor:\n  Karve:\n    CB: karve\n";
        let err = CorrectMatchIndex::from_yaml_str("cm.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("expected a list"));
    }

    #[test]
    fn rejects_blank_strings() {
        let yaml = "razor:\n  Karve:\n    CB: ['  ']\n";
        assert!(matches!(CorrectMatchIndex::from_yaml_str("cm.yaml", yaml), Err(Error::Schema { .. })));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = CorrectMatchIndex::from_file(&dir.path().join("correct_matches.yaml")).unwrap();
        assert!(index.is_empty());
    }
}
