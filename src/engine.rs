//! Matching engine.
//!
//! The engine turns one mention into one [`MatchResult`](crate::MatchResult).
//! It is split into focused submodules under `src/engine/` while the public
//! surface stays in `api.rs`.
//!
//! ## How the parts work together
//!
//! ```text
//! catalogs (all) ──┐
//!                  │  CompiledCatalogs::new        (compiled_catalog.rs)
//!                  └──────────────┬────────────────
//!                                 │
//! mention ── normalize ───────────┼─ exact tier: CorrectMatchIndex::lookup
//!                                 │
//!                                 ├─ pattern tier: rank_hits       (pattern.rs)
//!                                 │    - RegexSet prefilter
//!                                 │    - priority, then specificity
//!                                 │
//!                                 ├─ fuzzy tier: best_match        (fuzzy.rs)
//!                                 │
//!                brush only ──────┴─ CompositeSignals::scan        (trigger.rs)
//!                                    resolve_brush                 (composite.rs)
//!                                 │
//!                                 v
//!                       MatchResult constructors (resolve.rs)
//! ```
//!
//! Tiers are strictly ordered and the first tier with an outcome decides the
//! result. An ambiguous pattern outcome *is* an outcome: it becomes
//! `multiple` and the fuzzy tier is not consulted.
//!
//! ## Responsibilities by module
//!
//! - `compiled_catalog.rs`: compiles every catalog pattern once and builds a
//!   `RegexSet` per section.
//! - `pattern.rs`: collects per-entry hits and ranks them.
//! - `fuzzy.rs`: edit-distance fallback against canonical names.
//! - `trigger.rs`: scans brush mentions for handle/knot split delimiters.
//! - `composite.rs`: the brush resolution order.
//! - `resolve.rs`: tier orchestration and `MatchResult` assembly.
//! - `metrics.rs`: optional per-tier trace and timings.
//!
//! ## Debugging
//!
//! Every tier decision is logged at `debug` level under the `gearmatch`
//! target; `RUST_LOG=gearmatch=debug` shows the full walk for each mention.

#[path = "engine/compiled_catalog.rs"]
mod compiled_catalog;
#[path = "engine/composite.rs"]
mod composite;
#[path = "engine/fuzzy.rs"]
mod fuzzy;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/pattern.rs"]
mod pattern;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/trigger.rs"]
mod trigger;

pub(crate) use compiled_catalog::CompiledCatalogs;
pub use metrics::{RunMetrics, Tier, TierOutcome, TierTrace};
pub(crate) use metrics::Tracer;
pub(crate) use resolve::{Tables, resolve_text};
