//! Sample catalogs shared by the scenario tests; the same files ship in `data/`.

use crate::{Resolver, ResolverConfig, Section};

pub const RAZORS: &str = include_str!("../data/razors.yaml");
pub const BLADES: &str = include_str!("../data/blades.yaml");
pub const BRUSHES: &str = include_str!("../data/brushes.yaml");
pub const HANDLES: &str = include_str!("../data/handles.yaml");
pub const KNOTS: &str = include_str!("../data/knots.yaml");
pub const SOAPS: &str = include_str!("../data/soaps.yaml");
pub const CORRECT_MATCHES: &str = include_str!("../data/correct_matches.yaml");

pub fn resolver_with(config: ResolverConfig) -> Resolver {
    Resolver::builder()
        .section(Section::Razor, RAZORS)
        .section(Section::Blade, BLADES)
        .section(Section::Brush, BRUSHES)
        .section(Section::Handle, HANDLES)
        .section(Section::Knot, KNOTS)
        .section(Section::Soap, SOAPS)
        .correct_matches(CORRECT_MATCHES)
        .config(config)
        .build()
        .expect("fixture catalogs load")
}

pub fn resolver() -> Resolver {
    resolver_with(ResolverConfig::default())
}
