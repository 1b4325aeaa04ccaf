//! Resolution trace and timings.
//!
//! The intended usage is:
//!
//! - `Resolver::resolve_with` for normal operation (tracing disabled).
//! - `Resolver::resolve_verbose_with` for debugging a single mention: it
//!   records every tier that was consulted, what it concluded and how long it
//!   took.
//!
//! ## Design notes
//!
//! - A disabled [`Tracer`] never evaluates the detail closures, so the hot
//!   path allocates nothing for tracing.
//! - Steps are recorded in the order tiers ran; the last step is the one that
//!   decided the result (or the last miss for `none`).

use crate::Section;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

// --- Metrics -----------------------------------------------------------------

/// A resolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Exact,
    Pattern,
    Fuzzy,
    /// Delimiter split of a brush mention into handle and knot.
    Split,
    /// Handle and knot patterns found in disjoint spans.
    CoOccurrence,
    /// Bare knot mention resolved through the knot catalog.
    KnotFallback,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Exact => "exact",
            Tier::Pattern => "pattern",
            Tier::Fuzzy => "fuzzy",
            Tier::Split => "split",
            Tier::CoOccurrence => "co_occurrence",
            Tier::KnotFallback => "knot_fallback",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOutcome {
    Hit,
    Ambiguous,
    Miss,
    /// The tier did not run (disabled, or the mention is too short).
    Skipped,
}

/// One consulted tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierTrace {
    pub tier: Tier,
    pub section: Section,
    pub outcome: TierOutcome,
    /// Human-readable summary: winning pattern, tied candidates, distance...
    pub detail: String,
    pub duration: Duration,
}

/// Timings for one resolution.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Total elapsed time including normalization.
    pub total: Duration,
    /// Time spent in `normalize`.
    pub normalize: Duration,
    /// Tiers in the order they ran.
    pub tiers: Vec<TierTrace>,
}

impl RunMetrics {
    /// The step that decided the result, if any tier produced an outcome.
    pub fn deciding_tier(&self) -> Option<&TierTrace> {
        self.tiers.iter().rev().find(|t| matches!(t.outcome, TierOutcome::Hit | TierOutcome::Ambiguous))
    }
}

/// Collects [`TierTrace`]s while a mention is resolved.
#[derive(Debug)]
pub(crate) struct Tracer {
    enabled: bool,
    started: Instant,
    metrics: RunMetrics,
}

impl Tracer {
    pub fn new(enabled: bool) -> Self {
        Tracer { enabled, started: Instant::now(), metrics: RunMetrics::default() }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn normalized(&mut self, duration: Duration) {
        self.metrics.normalize = duration;
    }

    pub fn record(
        &mut self,
        tier: Tier,
        section: Section,
        outcome: TierOutcome,
        started: Instant,
        detail: impl FnOnce() -> String,
    ) {
        if self.enabled {
            self.metrics.tiers.push(TierTrace { tier, section, outcome, detail: detail(), duration: started.elapsed() });
        }
    }

    pub fn finish(mut self) -> RunMetrics {
        self.metrics.total = self.started.elapsed();
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracer_records_nothing() {
        let mut tracer = Tracer::disabled();
        tracer.record(Tier::Exact, Section::Razor, TierOutcome::Miss, Instant::now(), || {
            panic!("detail must not be built when tracing is off")
        });
        assert!(tracer.finish().tiers.is_empty());
    }

    #[test]
    fn deciding_tier_is_the_last_outcome() {
        let mut tracer = Tracer::new(true);
        let now = Instant::now();
        tracer.record(Tier::Exact, Section::Blade, TierOutcome::Miss, now, String::new);
        tracer.record(Tier::Pattern, Section::Blade, TierOutcome::Ambiguous, now, || "2 tied".into());
        let metrics = tracer.finish();

        assert_eq!(metrics.tiers.len(), 2);
        let deciding = metrics.deciding_tier().unwrap();
        assert_eq!(deciding.tier, Tier::Pattern);
        assert_eq!(deciding.detail, "2 tied");
        assert!(metrics.total >= deciding.duration);
    }
}
