//! Website health: Core Web Vitals, meta-tag completeness and indexation.
//!
//! Health = 0.40 × CWV + 0.30 × meta + 0.30 × indexation, clamped to [0,100].

use serde::{Deserialize, Serialize};

use super::{clamp01, clamp_score, finite_or_zero, weighted_sum};

const W_CWV: f64 = 0.40;
const W_META: f64 = 0.30;
const W_INDEXATION: f64 = 0.30;

/// Published "good" / "poor" boundaries.
const LCP_GOOD_SECS: f64 = 2.5;
const LCP_POOR_SECS: f64 = 4.0;
const INP_GOOD_MS: f64 = 200.0;
const INP_POOR_MS: f64 = 500.0;
const CLS_GOOD: f64 = 0.1;
const CLS_POOR: f64 = 0.25;

/// Core Web Vitals readings: LCP in seconds, INP in milliseconds, CLS unitless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsInput {
    pub lcp: f64,
    pub inp: f64,
    pub cls: f64,
}

/// Presence ratios (0..1) of title, meta description and H1 across pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaInput {
    pub title: f64,
    pub description: f64,
    pub h1: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexationInput {
    pub indexed: f64,
    pub excluded: f64,
}

pub fn score_website_health(
    vitals: &VitalsInput,
    meta: &MetaInput,
    indexation: &IndexationInput,
) -> f64 {
    clamp_score(weighted_sum(&[
        (cwv_score(vitals), W_CWV),
        (meta_score(meta), W_META),
        (indexation_score(indexation), W_INDEXATION),
    ]))
}

/// Mean of the three per-vital scores.
pub fn cwv_score(v: &VitalsInput) -> f64 {
    let lcp = vital_score(v.lcp, LCP_GOOD_SECS, LCP_POOR_SECS);
    let inp = vital_score(v.inp, INP_GOOD_MS, INP_POOR_MS);
    let cls = vital_score(v.cls, CLS_GOOD, CLS_POOR);
    (lcp + inp + cls) / 3.0
}

pub fn meta_score(m: &MetaInput) -> f64 {
    (clamp01(m.title) + clamp01(m.description) + clamp01(m.h1)) / 3.0 * 100.0
}

/// `indexed / (indexed + excluded)` as a percentage; 0 when nothing is known.
pub fn indexation_score(ix: &IndexationInput) -> f64 {
    let indexed = finite_or_zero(ix.indexed).max(0.0);
    let excluded = finite_or_zero(ix.excluded).max(0.0);
    let total = indexed + excluded;
    if total <= 0.0 {
        return 0.0;
    }
    indexed / total * 100.0
}

/// Piecewise-linear, non-increasing in `value`:
/// 100 up to `good`, 50 at `poor`, 0 at `2 × poor` and beyond.
fn vital_score(value: f64, good: f64, poor: f64) -> f64 {
    let v = finite_or_zero(value).max(0.0);
    if v <= good {
        100.0
    } else if v <= poor {
        100.0 - 50.0 * (v - good) / (poor - good)
    } else {
        let tail = 2.0 * poor;
        (50.0 * (tail - v) / (tail - poor)).max(0.0)
    }
}
