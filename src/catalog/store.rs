//! Catalog store: brand/model definitions per section.
//!
//! A section file maps brand → model → definition:
//!
//! ```yaml
//! Declaration Grooming:
//!   B15:
//!     patterns:
//!       - 'declaration.*b-?15'
//!       - '\bdg\b.*b-?15'
//!     fiber: Badger
//!     knot_size_mm: 26.0
//!     priority: 1        # optional, higher wins ties
//! ```
//!
//! Every key other than `patterns` and `priority` is an attribute copied onto
//! the resolved identity.

use super::parse_yaml;
use crate::error::{Error, Result};
use crate::{Identity, Metadata, Section};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Attribute names that would collide with fields of serialized results.
pub(crate) const RESERVED_ATTRS: &[&str] =
    &["brand", "model", "handle", "knot", "handle_maker", "source_text", "match_type", "source", "strings"];

/// One brand/model definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub brand: String,
    pub model: String,
    /// Regular expressions in evaluation order.
    pub patterns: Vec<String>,
    /// Declared weight; a higher priority outranks a longer pattern.
    pub priority: i32,
    /// Position of the entry in its section file.
    pub ordinal: usize,
    pub metadata: Metadata,
}

impl CatalogEntry {
    pub fn identity(&self) -> Identity {
        Identity { brand: self.brand.clone(), model: self.model.clone(), metadata: self.metadata.clone() }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    patterns: Vec<String>,
    #[serde(default)]
    priority: i32,
    #[serde(flatten)]
    metadata: Metadata,
}

/// All entries of one section, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    section: Section,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn empty(section: Section) -> Self {
        Catalog { section, entries: Vec::new() }
    }

    /// Parse a section file. `origin` names the source in error messages.
    pub fn from_yaml_str(section: Section, origin: &str, content: &str) -> Result<Self> {
        let raw: IndexMap<String, IndexMap<String, serde_yaml::Value>> =
            parse_yaml(origin, content)?.unwrap_or_default();

        let mut entries = Vec::new();
        for (brand, models) in raw {
            if brand.trim().is_empty() {
                return Err(Error::schema(origin, "empty brand name"));
            }
            for (model, body) in models {
                let at = format!("{brand} / {model}");
                if model.trim().is_empty() {
                    return Err(Error::schema(origin, format!("{brand}: empty model name")));
                }
                let entry: RawEntry =
                    serde_yaml::from_value(body).map_err(|e| Error::schema(origin, format!("{at}: {e}")))?;

                if entry.patterns.is_empty() {
                    return Err(Error::schema(origin, format!("{at}: at least one pattern is required")));
                }
                if entry.patterns.iter().any(|p| p.trim().is_empty()) {
                    return Err(Error::schema(origin, format!("{at}: empty pattern")));
                }
                if let Some(key) = entry.metadata.keys().find(|k| RESERVED_ATTRS.contains(&k.as_str())) {
                    return Err(Error::schema(origin, format!("{at}: '{key}' is reserved and cannot be an attribute")));
                }

                entries.push(CatalogEntry {
                    brand: brand.clone(),
                    model,
                    patterns: entry.patterns,
                    priority: entry.priority,
                    ordinal: entries.len(),
                    metadata: entry.metadata,
                });
            }
        }

        Ok(Catalog { section, entries })
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive brand/model lookup.
    pub fn find(&self, brand: &str, model: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.brand.eq_ignore_ascii_case(brand) && e.model.eq_ignore_ascii_case(model))
    }
}

/// One catalog per section.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStore {
    catalogs: Vec<Catalog>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        CatalogStore { catalogs: Section::ALL.iter().map(|&s| Catalog::empty(s)).collect() }
    }
}

impl CatalogStore {
    /// Load every `<section>.yaml` present in `dir`.
    ///
    /// A missing file leaves that section empty (and is logged); a file that
    /// exists but does not parse fails the whole load.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut store = CatalogStore::default();
        for section in Section::ALL {
            let path = dir.join(section.file_name());
            if !path.exists() {
                warn!(section = %section, path = %path.display(), "catalog file missing; section left empty");
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            store.insert(Catalog::from_yaml_str(section, &path.display().to_string(), &content)?);
        }
        info!(
            razors = store.get(Section::Razor).len(),
            blades = store.get(Section::Blade).len(),
            brushes = store.get(Section::Brush).len(),
            handles = store.get(Section::Handle).len(),
            knots = store.get(Section::Knot).len(),
            soaps = store.get(Section::Soap).len(),
            "catalogs loaded"
        );
        Ok(store)
    }

    /// Replace the catalog of `catalog.section()`.
    pub fn insert(&mut self, catalog: Catalog) {
        let idx = Self::slot(catalog.section());
        self.catalogs[idx] = catalog;
    }

    pub fn get(&self, section: Section) -> &Catalog {
        &self.catalogs[Self::slot(section)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Catalog> {
        self.catalogs.iter()
    }

    fn slot(section: Section) -> usize {
        Section::ALL.iter().position(|&s| s == section).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttrValue;

    const BRUSHES: &str = r#"
Declaration Grooming:
  B15:
    patterns:
      - 'declaration.*b-?15'
      - '\bdg\b.*b-?15'
    fiber: Badger
    knot_size_mm: 26
Simpson:
  Chubby 2:
    patterns: ['simpson.*chubby\s*2', '\bch2\b']
    fiber: Badger
    priority: 2
"#;

    #[test]
    fn keeps_declaration_order_and_attributes() {
        let catalog = Catalog::from_yaml_str(Section::Brush, "brushes.yaml", BRUSHES).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = &catalog.entries()[0];
        assert_eq!(first.label(), "Declaration Grooming B15");
        assert_eq!(first.ordinal, 0);
        assert_eq!(first.priority, 0);
        assert_eq!(first.patterns.len(), 2);
        assert_eq!(first.metadata.get("knot_size_mm"), Some(&AttrValue::Number(26.0)));

        let second = &catalog.entries()[1];
        assert_eq!(second.ordinal, 1);
        assert_eq!(second.priority, 2);
        assert!(!second.metadata.contains_key("priority"));
        assert_eq!(second.identity().fiber(), Some("Badger"));
    }

    #[test]
    fn find_ignores_case() {
        let catalog = Catalog::from_yaml_str(Section::Brush, "brushes.yaml", BRUSHES).unwrap();
        assert!(catalog.find("simpson", "chubby 2").is_some());
        assert!(catalog.find("Simpson", "Duke 3").is_none());
    }

    #[test]
    fn empty_document_is_an_empty_catalog() {
        for content in ["", "   \n", "~\n"] {
            let catalog = Catalog::from_yaml_str(Section::Soap, "soaps.yaml", content).unwrap();
            assert!(catalog.is_empty());
        }
    }

    #[test]
    fn rejects_missing_patterns() {
        let err = Catalog::from_yaml_str(Section::Razor, "razors.yaml", "Karve:\n  CB:\n    format: DE\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("razors.yaml"), "{message}");
        assert!(message.contains("Karve / CB"), "{message}");
    }

    #[test]
    fn rejects_empty_pattern_list() {
        let err = Catalog::from_yaml_str(Section::Razor, "razors.yaml", "Karve:\n  CB:\n    patterns: []\n").unwrap_err();
        assert!(err.to_string().contains("at least one pattern"));
    }

    #[test]
    fn rejects_reserved_attribute() {
        let yaml = "Karve:\n  CB:\n    patterns: [karve]\n    brand: Other\n";
        let err = Catalog::from_yaml_str(Section::Razor, "razors.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn rejects_nested_attribute_values() {
        let yaml = "Karve:\n  CB:\n    patterns: [karve]\n    plates: [a, b]\n";
        assert!(matches!(Catalog::from_yaml_str(Section::Razor, "razors.yaml", yaml), Err(Error::Schema { .. })));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = Catalog::from_yaml_str(Section::Razor, "razors.yaml", "Karve: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
    }

    #[test]
    fn store_loads_present_files_and_leaves_others_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("brushes.yaml"), BRUSHES).unwrap();

        let store = CatalogStore::from_dir(dir.path()).unwrap();
        assert_eq!(store.get(Section::Brush).len(), 2);
        assert!(store.get(Section::Razor).is_empty());
        assert_eq!(store.iter().count(), Section::ALL.len());
    }

    #[test]
    fn store_fails_on_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("razors.yaml"), "Karve:\n  CB: 12\n").unwrap();
        assert!(CatalogStore::from_dir(dir.path()).is_err());
    }
}
