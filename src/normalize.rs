//! Lookup-key normalization.
//!
//! [`normalize`] is the single text transform used wherever a correct-match
//! key is produced (catalog load) or consulted (resolution). Two spellings
//! that a human would consider identical must converge to the same key:
//!
//! ```text
//! "  DG B15 w/ C&H Zebra. "  ─┐
//! "dg b15  w/ c&h zebra"      ├─▶ "dg b15 w/ c&h zebra"
//! "DG B15 w/ C&H Zebra $CNC" ─┘
//! ```
//!
//! ## Steps
//!
//! 1. Unicode NFKC (full-width forms, ligatures, compatibility letters).
//! 2. Lowercase.
//! 3. Fold typographic quotes and dashes to ASCII.
//! 4. Drop competition tags (`$TAG` tokens, glued runs like `$A$B` included)
//!    and markdown emphasis (`*`, `` ` ``).
//! 5. Collapse whitespace runs into one space.
//! 6. Trim surrounding whitespace and sentence punctuation.
//!
//! ## Invariants
//!
//! - Idempotent: `normalize(normalize(x)) == normalize(x)`.
//! - Empty or whitespace-only input yields `""`, and the resolver treats an
//!   empty key as "never matches".
//! - Separators inside a name (`&`, `/`, `-`, `+`) are kept. The pattern tier
//!   runs on the raw text anyway, and curated keys stay readable.

use unicode_normalization::UnicodeNormalization;

/// Characters trimmed from both ends of a key.
const EDGE_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Produce the canonical lookup key for `text`.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let folded: String = text.nfkc().collect::<String>().to_lowercase().chars().filter_map(fold_char).collect();

    let untagged = regex!(r"(?:^|[\s.,;:!?])(?:\$[\p{L}\p{N}_-]+)+").replace_all(&folded, " ");
    let collapsed = untagged.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c)).to_string()
}

/// Map a single character to its folded form, or drop it.
fn fold_char(c: char) -> Option<char> {
    match c {
        '*' | '`' => None,
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => Some('\''),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => Some('"'),
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => Some('-'),
        '\u{200B}' | '\u{FEFF}' => Some(' '),
        _ => Some(c),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn collapses_case_whitespace_and_edge_punctuation() {
        let cases: Vec<(&str, &str)> = vec![
            ("Karve CB", "karve cb"),
            ("  Karve   CB  ", "karve cb"),
            ("Karve CB.", "karve cb"),
            ("Karve CB!!", "karve cb"),
            ("\tKarve\nCB\t", "karve cb"),
            ("DG B15 w/ C&H Zebra", "dg b15 w/ c&h zebra"),
            ("**Blackland** Blackbird", "blackland blackbird"),
            ("`Feather` Hi-Stainless", "feather hi-stainless"),
            ("Gillette \u{2013} Tech", "gillette - tech"),
            ("Stirling \u{201C}Executive Man\u{201D}", "stirling \"executive man\""),
            ("Barrister\u{2019}s Reserve", "barrister's reserve"),
            ("\u{FF2B}\u{FF41}\u{FF52}\u{FF56}\u{FF45}", "karve"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn strips_competition_tags() {
        assert_eq!(normalize("Karve CB $CNC"), "karve cb");
        assert_eq!(normalize("$DOORKNOB Karve CB"), "karve cb");
        assert_eq!(normalize("Karve CB $CNC $ARTISTCLUB."), "karve cb");
        // A dollar sign inside a word is not a tag.
        assert_eq!(normalize("Price$ Soap"), "price$ soap");
        assert_eq!(normalize(".$CNC Karve CB"), "karve cb");
        // Glued tags go in one pass.
        assert_eq!(normalize("Karve CB $CNC$ARTISTCLUB"), "karve cb");
        assert_eq!(normalize("x $a-$b"), "x");
    }

    #[test]
    fn empty_and_blank_inputs_yield_empty_key() {
        for input in ["", " ", "\t\n", "...", " $TAG ", "**"] {
            assert_eq!(normalize(input), "", "input: {input:?}");
        }
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "DG B15 w/ C&H Zebra",
            "  Semogue   SOC  Boar.  ",
            "Gillette \u{2014} Slim Adjustable (setting 5)",
            "\u{212A}arve",
            "\u{1D2C}stra SP",
            "\u{0130}stanbul Soap",
            "ﬁne Platinum",
            "Chisel & Hound $CNC Zebra?!",
            "Tabac",
            "a $b $c d",
            ".$tag x",
            "x.$tag",
            "*** ",
            "Mühle R89",
            "x $a$b",
            "Karve CB $CNC$ARTISTCLUB",
            "x $a-$b",
            "$a$b$c Tabac",
        ];

        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(&once);
            assert_eq!(once, twice, "sample: {sample:?}");
        }
    }
}
