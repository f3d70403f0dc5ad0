//! Overall score: one more blend over the already-bounded part scores.
//!
//! `explain_overall` returns the same number plus the per-part contribution
//! so dashboards can show where the headline comes from.

use serde::{Deserialize, Serialize};

use super::{clamp_score, finite_or_zero};

/// Part scores, each already in 0..100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallParts {
    pub seo: f64,
    pub aeo: f64,
    pub geo: f64,
    pub ai: f64,
    pub wh: f64,
    pub mystery: f64,
}

/// `(part name, weight)` in blending order. AEO outweighs GEO.
pub const OVERALL_WEIGHTS: [(&str, f64); 6] = [
    ("seo", 0.20),
    ("aeo", 0.25),
    ("geo", 0.15),
    ("ai", 0.15),
    ("wh", 0.15),
    ("mystery", 0.10),
];

impl OverallParts {
    fn values(&self) -> [f64; 6] {
        [self.seo, self.aeo, self.geo, self.ai, self.wh, self.mystery]
    }
}

/// One part's share of the headline number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub part: String,
    pub value: f64,
    pub weight: f64,
    /// `value × weight` (before the final clamp).
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallBreakdown {
    pub score: f64,
    pub contributions: Vec<Contribution>,
}

pub fn score_overall(parts: &OverallParts) -> f64 {
    let raw: f64 = parts
        .values()
        .iter()
        .zip(OVERALL_WEIGHTS.iter())
        .map(|(v, (_, w))| finite_or_zero(*v) * w)
        .sum();
    clamp_score(raw)
}

pub fn explain_overall(parts: &OverallParts) -> OverallBreakdown {
    let contributions = parts
        .values()
        .iter()
        .zip(OVERALL_WEIGHTS.iter())
        .map(|(v, (name, w))| {
            let value = finite_or_zero(*v);
            Contribution {
                part: (*name).to_string(),
                value,
                weight: *w,
                contribution: value * w,
            }
        })
        .collect::<Vec<_>>();

    OverallBreakdown {
        score: score_overall(parts),
        contributions,
    }
}
