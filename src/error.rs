//! Error types.
//!
//! Everything here is a *load-time* failure. Per-mention outcomes such as
//! "no match" or "ambiguous" are encoded in [`crate::MatchType`] and never
//! surface as errors.

use crate::Section;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid catalog data in {origin}: {message}")]
    Schema { origin: String, message: String },

    #[error("invalid pattern for {section} '{brand} / {model}': {pattern:?}: {source}")]
    Pattern {
        section: Section,
        brand: String,
        model: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("conflicting correct matches for {key:?} in {section}: {first} vs {second}")]
    Conflict { section: Section, key: String, first: String, second: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn schema(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema { origin: origin.into(), message: message.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_origin() {
        let error = Error::schema("razors.yaml", "Karve / CB: missing patterns");
        assert_eq!(error.to_string(), "invalid catalog data in razors.yaml: Karve / CB: missing patterns");
    }

    #[test]
    fn io_error_names_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = Error::io("/catalog/razors.yaml", source);
        let display = error.to_string();
        assert!(display.contains("/catalog/razors.yaml"));
        assert!(display.contains("gone"));
    }

    #[test]
    fn conflict_error_lists_both_identities() {
        let error = Error::Conflict {
            section: Section::Razor,
            key: "karve cb".into(),
            first: "Karve Christopher Bradley".into(),
            second: "Karve Overlander".into(),
        };
        let display = error.to_string();
        assert!(display.contains("razor"));
        assert!(display.contains("Karve Christopher Bradley"));
        assert!(display.contains("Karve Overlander"));
    }
}
