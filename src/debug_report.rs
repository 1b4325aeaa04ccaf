use gearmatch::{
    Category, Identity, MatchType, Matched, Part, ResolutionVerbose, Resolver, Section, SelfCheckFailure, Source,
    TierOutcome, TierTrace,
};

mod ansi {
    const RESET: &str = "\x1b[0m";
    const DIM: &str = "\x1b[2m";
    const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    /// Wraps text in ANSI codes when enabled; plain text otherwise.
    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, text: impl AsRef<str>, code: &str) -> String {
            let text = text.as_ref();
            if self.enabled { format!("{code}{text}{RESET}") } else { text.to_string() }
        }

        pub fn bold(&self, text: impl AsRef<str>) -> String {
            self.paint(text, BOLD)
        }

        pub fn dim(&self, text: impl AsRef<str>) -> String {
            self.paint(text, DIM)
        }
    }
}

pub fn print_run(category: Category, verbose: &ResolutionVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    let result = &verbose.result;
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Resolving {category}: \"{}\"", result.original), ansi::CYAN)));
    println!("  {} {}", palette.dim("normalized:"), palette.paint(format!("{:?}", result.normalized), ansi::YELLOW));

    println!("\n{}", palette.paint("━━━ Tiers ━━━", ansi::GRAY));
    if verbose.metrics.tiers.is_empty() {
        println!("{}", palette.dim("  No tier consulted (empty mention)"));
    }
    for trace in &verbose.metrics.tiers {
        print_trace(trace, &palette);
    }

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    println!("  {} {}", palette.dim("match_type:"), paint_match_type(result.match_type, &palette));
    match &result.matched {
        Matched::Simple(identity) => print_identity(identity, &palette),
        Matched::Deferred(composite) => {
            println!("  {}", palette.dim("brand/model deferred (handle/knot composite)"));
            print_part("handle", &composite.handle, &palette);
            print_part("knot", &composite.knot, &palette);
        }
        Matched::Unresolved => println!("{}", palette.dim("  No match")),
    }
    println!("  {} {}", palette.dim("source:"), fmt_source(&result.source, &palette));

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Normalize: {}",
        palette.paint(format!("{:?}", verbose.metrics.total), ansi::GREEN),
        palette.dim(format!("{:?}", verbose.metrics.normalize)),
    );
    println!();
}

pub fn print_check(resolver: &Resolver, failures: &[SelfCheckFailure], color: bool) {
    let palette = ansi::Palette::new(color);

    println!("\n{}", palette.paint("━━━ Catalogs ━━━", ansi::GRAY));
    for section in Section::ALL {
        println!(
            "  {} {}",
            palette.paint(format!("{:<7}", section.as_str()), ansi::BLUE),
            palette.dim(format!("{} entries", resolver.catalog(section).len()))
        );
    }
    println!(
        "  {} {}",
        palette.paint(format!("{:<7}", "curated"), ansi::BLUE),
        palette.dim(format!("{} strings", resolver.correct_matches().len()))
    );

    println!("\n{}", palette.paint("━━━ Self-check ━━━", ansi::GRAY));
    if failures.is_empty() {
        println!("  {}", palette.paint("✓ every curated string resolves exactly", ansi::GREEN));
        println!();
        return;
    }
    for failure in failures {
        println!(
            "  {} {} {}",
            palette.paint("✗", ansi::RED),
            palette.paint(failure.section.as_str(), ansi::BLUE),
            palette.bold(format!("{:?}", failure.text))
        );
        println!("      {} {}", palette.dim("expected:"), palette.paint(&failure.expected, ansi::GREEN));
        println!("      {} {}", palette.dim("actual:  "), palette.paint(&failure.actual, ansi::YELLOW));
    }
    println!("\n  {}", palette.paint(format!("{} failure(s)", failures.len()), ansi::RED));
    println!();
}

fn print_trace(trace: &TierTrace, palette: &ansi::Palette) {
    let outcome = match trace.outcome {
        TierOutcome::Hit => palette.paint("✓ hit", ansi::GREEN),
        TierOutcome::Ambiguous => palette.paint("≈ ambiguous", ansi::YELLOW),
        TierOutcome::Miss => palette.dim("✗ miss"),
        TierOutcome::Skipped => palette.dim("- skipped"),
    };
    println!(
        "  {} {} {} {}",
        palette.paint(format!("{:<14}", trace.tier.as_str()), ansi::BLUE),
        palette.dim(format!("{:<7}", trace.section.as_str())),
        outcome,
        palette.dim(format!("{:?}", trace.duration)),
    );
    if !trace.detail.is_empty() {
        println!("      {}", palette.paint(&trace.detail, ansi::CYAN));
    }
}

fn print_identity(identity: &Identity, palette: &ansi::Palette) {
    println!("  {}", palette.bold(palette.paint(identity.label(), ansi::GREEN)));
    for (name, value) in &identity.metadata {
        println!("    {} {}", palette.dim(format!("{name}:")), value);
    }
}

fn print_part(role: &str, part: &Part, palette: &ansi::Palette) {
    println!(
        "  {} {} {}",
        palette.paint(format!("{role}:"), ansi::BLUE),
        palette.bold(palette.paint(part.identity.label(), ansi::GREEN)),
        palette.dim(format!("from {:?}, {}", part.source_text, part.match_type)),
    );
    for (name, value) in &part.identity.metadata {
        println!("      {} {}", palette.dim(format!("{name}:")), value);
    }
    println!("      {} {}", palette.dim("source:"), fmt_source(&part.source, palette));
}

fn paint_match_type(match_type: MatchType, palette: &ansi::Palette) -> String {
    let color = match match_type {
        MatchType::Exact | MatchType::Pattern => ansi::GREEN,
        MatchType::Fuzzy | MatchType::Multiple => ansi::YELLOW,
        MatchType::None => ansi::RED,
    };
    palette.bold(palette.paint(match_type.as_str(), color))
}

fn fmt_source(source: &Source, palette: &ansi::Palette) -> String {
    match source {
        Source::CorrectMatch { section } => format!("correct_matches ({})", section.as_str()),
        Source::Pattern { section, pattern, priority, tie_break } => {
            let mut out = format!("{} pattern {}", section.as_str(), palette.paint(pattern, ansi::CYAN));
            if *priority != 0 {
                out.push_str(&format!(" priority {priority}"));
            }
            if let Some(tie_break) = tie_break {
                out.push_str(&format!(" (tie broken by {tie_break})"));
            }
            out
        }
        Source::Fuzzy { section, candidate, distance } => {
            format!("{} fuzzy {} distance {distance:.3}", section.as_str(), palette.paint(candidate, ansi::CYAN))
        }
        Source::Ambiguous { section, candidates } => {
            format!("{} ambiguous between {}", section.as_str(), palette.paint(candidates.join(" | "), ansi::YELLOW))
        }
        Source::Composite { signal } => format!("composite via {signal}"),
        Source::Unmatched => palette.dim("no tier matched"),
        Source::Empty => palette.dim("empty mention"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_only_colors_when_enabled() {
        let plain = ansi::Palette::new(false);
        assert_eq!(plain.paint("exact", ansi::GREEN), "exact");
        assert_eq!(plain.bold(plain.dim("none")), "none");

        let color = ansi::Palette::new(true);
        assert_eq!(color.paint("exact", ansi::GREEN), "\x1b[32mexact\x1b[0m");
        assert_eq!(color.dim("none"), "\x1b[2mnone\x1b[0m");
    }

    #[test]
    fn sources_read_as_one_line() {
        let palette = ansi::Palette::new(false);
        let cases: Vec<(Source, &str)> = vec![
            (Source::CorrectMatch { section: Section::Handle }, "correct_matches (handle)"),
            (Source::Composite { signal: "w/".into() }, "composite via w/"),
            (
                Source::Fuzzy { section: Section::Soap, candidate: "Stirling Soap Co. Bay Rum".into(), distance: 1.0 },
                "soap fuzzy Stirling Soap Co. Bay Rum distance 1.000",
            ),
            (Source::Empty, "empty mention"),
        ];
        for (source, expected) in cases {
            assert_eq!(fmt_source(&source, &palette), expected);
        }
        assert_eq!(paint_match_type(MatchType::Exact, &palette), "exact");
    }
}
