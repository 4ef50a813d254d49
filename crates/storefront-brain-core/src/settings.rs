//! Engine tunables.
//!
//! The thresholds below are hand-tuned; they are named and overridable
//! rather than derived. The root crate fills them from the `[engine]`
//! section of the config file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Candidates kept after keyword scoring.
    pub keyword_top_k: usize,
    /// A ceiling is "moderately" unrealistic when the cheapest product in
    /// the category costs at most this many times the ceiling. Widening is
    /// skipped and the empty result is returned as-is.
    pub moderate_mismatch_ratio: f64,
    /// Ceilings at or above this are suspicious when paired with "cheap"
    /// wording or unknown terms.
    pub suspicious_budget_threshold: f64,
    /// `ceiling * ratio <= category min` escalates as `budget_very_low`.
    pub very_low_budget_ratio: f64,
    /// `ceiling >= category max * ratio` is a generous budget, no escalation.
    pub budget_clear_ratio: f64,
    /// Without a category, ceilings below this are reported as a price
    /// mismatch even when something matched.
    pub very_low_global_budget: f64,
    /// Generic premium queries keep products at or above this price
    /// percentile of the candidate set.
    pub premium_percentile: f64,
    /// Minimum candidates before the premium percentile cut applies.
    pub premium_min_candidates: usize,
    /// Products offered when falling back to items above the ceiling.
    pub above_budget_fallback: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            keyword_top_k: 20,
            moderate_mismatch_ratio: 3.0,
            suspicious_budget_threshold: 2000.0,
            very_low_budget_ratio: 1.5,
            budget_clear_ratio: 1.5,
            very_low_global_budget: 20.0,
            premium_percentile: 0.75,
            premium_min_candidates: 4,
            above_budget_fallback: 5,
        }
    }
}
