//! Fuzzy tier: edit distance against canonical entry names.
//!
//! Only consulted when the exact and pattern tiers found nothing. The
//! normalized mention is compared with `normalize("{brand} {model}")` of every
//! entry in the section; the metric and acceptance bound come from
//! [`FuzzyConfig`].
//!
//! ```text
//! "karve christopher bradly"  vs  "karve christopher bradley"  -> 1 edit
//! ```
//!
//! A tie for the best accepted distance is treated as no match.

use super::compiled_catalog::CompiledCatalog;
use crate::config::FuzzyConfig;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FuzzyOutcome {
    Unique {
        entry: usize,
        /// Edit count, or `1 - similarity` for the normalized metric.
        distance: f64,
    },
    /// Entries sharing the best accepted distance.
    Tied(Vec<usize>),
    NoMatch,
    /// Disabled, or the mention is shorter than `min_length`.
    Skipped,
}

/// Distance of `a` to `b` under `config`, or `None` when not accepted.
fn accepted_distance(config: &FuzzyConfig, a: &str, b: &str) -> Option<f64> {
    match *config {
        FuzzyConfig::Levenshtein { max_distance, .. } => {
            let distance = strsim::levenshtein(a, b);
            (distance <= max_distance).then_some(distance as f64)
        }
        FuzzyConfig::NormalizedLevenshtein { min_similarity, .. } => {
            let similarity = strsim::normalized_levenshtein(a, b);
            (similarity >= min_similarity).then_some(1.0 - similarity)
        }
        FuzzyConfig::Disabled => None,
    }
}

pub(crate) fn best_match(catalog: &CompiledCatalog, normalized: &str, config: &FuzzyConfig) -> FuzzyOutcome {
    if normalized.chars().count() < config.min_length() {
        return FuzzyOutcome::Skipped;
    }

    let mut best: Option<f64> = None;
    let mut winners: Vec<usize> = Vec::new();
    for (entry, name) in catalog.canonical_names() {
        let Some(distance) = accepted_distance(config, normalized, name) else {
            continue;
        };
        match best {
            Some(current) if distance > current => {}
            Some(current) if distance == current => winners.push(entry),
            _ => {
                best = Some(distance);
                winners.clear();
                winners.push(entry);
            }
        }
    }

    match best {
        None => FuzzyOutcome::NoMatch,
        Some(distance) if winners.len() == 1 => FuzzyOutcome::Unique { entry: winners[0], distance },
        Some(_) => FuzzyOutcome::Tied(winners),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Section;
    use crate::catalog::Catalog;

    const SOAPS: &str = r#"
Declaration Grooming:
  Original:
    patterns: ['declaration.*original']
Stirling:
  Bay Rum:
    patterns: ['stirling.*bay\s*rum']
Barrister and Mann:
  Seville:
    patterns: ['seville']
  Reserve:
    patterns: ['reserve']
"#;

    fn soaps() -> CompiledCatalog {
        CompiledCatalog::new(&Catalog::from_yaml_str(Section::Soap, "soaps.yaml", SOAPS).unwrap()).unwrap()
    }

    #[test]
    fn levenshtein_accepts_within_bound() {
        let soaps = soaps();
        let config = FuzzyConfig::default();
        let cases: Vec<(&str, FuzzyOutcome)> = vec![
            ("stirling bay rum", FuzzyOutcome::Unique { entry: 1, distance: 0.0 }),
            ("stirlng bay rumm", FuzzyOutcome::Unique { entry: 1, distance: 2.0 }),
            ("stirlng by rumm", FuzzyOutcome::NoMatch),
            ("abc", FuzzyOutcome::Skipped),
        ];
        for (mention, expected) in cases {
            assert_eq!(best_match(&soaps, mention, &config), expected, "mention {mention:?}");
        }
    }

    #[test]
    fn best_distance_tie_is_reported() {
        let yaml = "A:\n  Abcd:\n    patterns: [x1]\n  Abce:\n    patterns: [x2]\n";
        let catalog = CompiledCatalog::new(&Catalog::from_yaml_str(Section::Soap, "s.yaml", yaml).unwrap()).unwrap();
        assert_eq!(best_match(&catalog, "a abcf", &FuzzyConfig::default()), FuzzyOutcome::Tied(vec![0, 1]));
    }

    #[test]
    fn closest_name_wins() {
        assert_eq!(
            best_match(&soaps(), "barrister and mann sevile", &FuzzyConfig::default()),
            FuzzyOutcome::Unique { entry: 2, distance: 1.0 }
        );
    }

    #[test]
    fn normalized_metric_reports_one_minus_similarity() {
        let soaps = soaps();
        let config = FuzzyConfig::NormalizedLevenshtein { min_similarity: 0.9, min_length: 4 };
        let FuzzyOutcome::Unique { entry, distance } = best_match(&soaps, "stirling bay rumm", &config) else {
            panic!("expected a unique match");
        };
        assert_eq!(entry, 1);
        assert!(distance > 0.0 && distance <= 0.1, "distance {distance}");

        assert_eq!(best_match(&soaps, "stirling", &config), FuzzyOutcome::NoMatch);
    }

    #[test]
    fn disabled_metric_skips() {
        assert_eq!(best_match(&soaps(), "stirling bay rum", &FuzzyConfig::Disabled), FuzzyOutcome::Skipped);
    }
}
