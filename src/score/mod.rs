// src/score/mod.rs
//! Bounded composite scorers.
//!
//! Every scorer here is a pure function: fixed weights, fixed field order,
//! weighted sum, clamp to `[0, 100]`. Raw inputs may legitimately sit outside
//! that range (provisional scores above 100, negative penalties); they are
//! never rejected, only clamped at the output.

pub mod composite;
pub mod eeat;
pub mod health;
pub mod mystery;
pub mod overall;

pub use crate::score::composite::{
    score_ai_visibility, score_ai_visibility_with, score_composite, EngineCoverage, MetricBlock,
    Pillar, PillarWeights,
};
pub use crate::score::eeat::{score_eeat, EeatFlags};
pub use crate::score::health::{
    score_website_health, IndexationInput, MetaInput, VitalsInput,
};
pub use crate::score::mystery::{score_mystery, MysteryMetrics};
pub use crate::score::overall::{
    explain_overall, score_overall, Contribution, OverallBreakdown, OverallParts,
};

/// Upper bound of every composite score.
pub const SCORE_MAX: f64 = 100.0;

/// Clamp to `[0, 100]`. Infinities saturate to the nearer bound, NaN is 0.
pub fn clamp_score(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, SCORE_MAX)
    }
}

/// Clamp to `[0, 1]`. Infinities saturate to the nearer bound, NaN is 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Treat non-finite inputs as 0 so they never poison a weighted sum.
#[inline]
pub(crate) fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Weighted sum over `(value, weight)` pairs in the given order.
pub(crate) fn weighted_sum(pairs: &[(f64, f64)]) -> f64 {
    pairs
        .iter()
        .map(|(v, w)| finite_or_zero(*v) * w)
        .sum()
}
