//! Composite signal scanning (brush pre-classification).
//!
//! This module inspects a raw brush mention and produces the coarse signals
//! the composite resolver needs before it touches any catalog:
//!
//! - **Delimiters** (`SignalMask`): which handle/knot separators occur
//!   (`w/`, `with`, `in`, ` / `, `+`).
//! - **Keyword hints**: whether the words `handle` or `knot` appear, globally
//!   and per side of each split.
//! - **Splits** (`CompositeSignals::splits`): one left/right candidate per
//!   delimiter occurrence.
//!
//! ## Design notes
//!
//! - This is a *heuristic* scan. A split is only a candidate: both sides still
//!   have to resolve through the handle and knot tiers before a composite is
//!   produced.
//! - Delimiters must be surrounded by whitespace (`w/` may be glued to the
//!   knot: "Zebra w/B15"), so a slash or plus inside a model name such as
//!   "B/W" or "Tuxedo+" does not split.
//!
//! ## Extension points
//!
//! - Adding a delimiter: add a `SignalMask` bit and an entry to `delimiters()`.

use std::ops::Range;

bitflags::bitflags! {
    /// Coarse composite signals found in a mention.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct SignalMask: u8 {
        const WITH_ABBREV  = 1 << 0;
        const WITH         = 1 << 1;
        const IN           = 1 << 2;
        const SLASH        = 1 << 3;
        const PLUS         = 1 << 4;
        const HANDLE_WORD  = 1 << 5;
        const KNOT_WORD    = 1 << 6;

        const DELIMITERS = Self::WITH_ABBREV.bits()
            | Self::WITH.bits()
            | Self::IN.bits()
            | Self::SLASH.bits()
            | Self::PLUS.bits();
    }
}

impl SignalMask {
    /// Provenance label of a single delimiter bit.
    pub fn label(self) -> &'static str {
        if self == SignalMask::WITH_ABBREV {
            "w/"
        } else if self == SignalMask::WITH {
            "with"
        } else if self == SignalMask::IN {
            "in"
        } else if self == SignalMask::SLASH {
            "/"
        } else if self == SignalMask::PLUS {
            "+"
        } else {
            "mixed"
        }
    }
}

/// Which part a side of a split names explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Handle,
    Knot,
}

/// A left/right candidate split of a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Split {
    pub delimiter: SignalMask,
    pub left: Range<usize>,
    pub right: Range<usize>,
}

impl Split {
    pub fn left<'t>(&self, text: &'t str) -> &'t str {
        &text[self.left.clone()]
    }

    pub fn right<'t>(&self, text: &'t str) -> &'t str {
        &text[self.right.clone()]
    }
}

/// Input characteristics detected from a raw brush mention.
#[derive(Debug, Clone)]
pub(crate) struct CompositeSignals {
    pub mask: SignalMask,
    /// Candidates in order of delimiter position.
    pub splits: Vec<Split>,
}

fn delimiters() -> [(SignalMask, &'static regex::Regex); 5] {
    [
        (SignalMask::WITH_ABBREV, regex!(r"(?i)\s+w/\s*")),
        (SignalMask::WITH, regex!(r"(?i)\s+with\s+")),
        (SignalMask::IN, regex!(r"(?i)\s+in\s+")),
        (SignalMask::SLASH, regex!(r"\s+/\s+")),
        (SignalMask::PLUS, regex!(r"\s+\+\s+")),
    ]
}

/// Range of `text[range]` with surrounding whitespace and punctuation removed.
fn trimmed(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let is_edge = |c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '.');
    let start = range.start + (slice.len() - slice.trim_start_matches(is_edge).len());
    let end = range.end - (slice.len() - slice.trim_end_matches(is_edge).len());
    start..end.max(start)
}

/// Keyword hint of one side of a split.
pub(crate) fn side_hint(side: &str) -> Option<Hint> {
    let handle = regex!(r"(?i)\bhandle\b").is_match(side);
    let knot = regex!(r"(?i)\bknot\b").is_match(side);
    match (handle, knot) {
        (true, false) => Some(Hint::Handle),
        (false, true) => Some(Hint::Knot),
        _ => None,
    }
}

impl CompositeSignals {
    /// Scan `text` for delimiters and keyword hints.
    pub fn scan(text: &str) -> Self {
        let mut mask = SignalMask::empty();
        let mut splits = Vec::new();

        for (signal, re) in delimiters() {
            for m in re.find_iter(text) {
                let left = trimmed(text, 0..m.start());
                let right = trimmed(text, m.end()..text.len());
                if left.is_empty() || right.is_empty() {
                    continue;
                }
                mask |= signal;
                splits.push(Split { delimiter: signal, left, right });
            }
        }
        splits.sort_by_key(|s| (s.left.end, s.delimiter.bits()));

        if regex!(r"(?i)\bhandle\b").is_match(text) {
            mask |= SignalMask::HANDLE_WORD;
        }
        if regex!(r"(?i)\bknot\b").is_match(text) {
            mask |= SignalMask::KNOT_WORD;
        }

        CompositeSignals { mask, splits }
    }

    pub fn has_delimiter(&self) -> bool {
        self.mask.intersects(SignalMask::DELIMITERS)
    }
}
