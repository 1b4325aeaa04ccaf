//! Curated reference data.
//!
//! Two kinds of data are loaded once per process and then only read:
//!
//! - **Catalogs** (`store.rs`): per section, brand → model → patterns and
//!   attributes. Declaration order is kept and recorded on every entry.
//! - **Correct matches** (`correct.rs`): exact, human-confirmed mention
//!   strings mapped to identities, including handle/knot composites.
//!
//! ## Files
//!
//! ```text
//! catalog/
//!   razors.yaml  blades.yaml  brushes.yaml  soaps.yaml   whole products
//!   handles.yaml knots.yaml                              brush parts
//!   correct_matches.yaml                                 curated overrides
//! ```
//!
//! ## Invariants
//!
//! - Loading is all-or-nothing: any schema violation is an `Error`, never a
//!   skipped entry.
//! - Nothing here compiles regexes; `engine::CompiledCatalog` does that, so a
//!   bad pattern still fails before the first mention is resolved.

#[path = "catalog/correct.rs"]
mod correct;
#[path = "catalog/store.rs"]
mod store;

pub use correct::{CorrectMatchEntry, CorrectMatchIndex, CuratedString};
pub use store::{Catalog, CatalogEntry, CatalogStore};

pub(crate) use store::RESERVED_ATTRS;

use crate::error::{Error, Result};

/// Parse a YAML document that may be empty or `~` into `Option<T>`.
pub(crate) fn parse_yaml<T: serde::de::DeserializeOwned>(origin: &str, content: &str) -> Result<Option<T>> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str::<Option<T>>(content).map_err(|source| Error::Yaml { origin: origin.to_string(), source })
}
