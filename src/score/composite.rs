//! Pillar composite (SEO / AEO / GEO) and AI-visibility scoring.
//!
//! `score_composite` blends the four sub-metrics of a pillar with that
//! pillar's own weight quadruple; `score_ai_visibility` blends per-engine
//! visibility with the shared engine weight table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{clamp_score, weighted_sum};
use crate::engines::{Engine, EngineWeights};
use crate::error::ScoreError;

/// Raw sub-metrics for one pillar evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBlock {
    pub mentions: f64,
    pub citations: f64,
    pub sentiment: f64,
    #[serde(rename = "shareOfVoice")]
    pub share_of_voice: f64,
}

impl MetricBlock {
    /// All four fields set to the same value.
    pub fn uniform(v: f64) -> Self {
        Self {
            mentions: v,
            citations: v,
            sentiment: v,
            share_of_voice: v,
        }
    }
}

/// Visibility pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    Seo,
    Aeo,
    Geo,
}

impl Pillar {
    pub const ALL: [Pillar; 3] = [Pillar::Seo, Pillar::Aeo, Pillar::Geo];

    pub fn as_str(self) -> &'static str {
        match self {
            Pillar::Seo => "seo",
            Pillar::Aeo => "aeo",
            Pillar::Geo => "geo",
        }
    }

    pub fn weights(self) -> PillarWeights {
        match self {
            Pillar::Seo => PillarWeights::SEO,
            Pillar::Aeo => PillarWeights::AEO,
            Pillar::Geo => PillarWeights::GEO,
        }
    }
}

impl FromStr for Pillar {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seo" => Ok(Pillar::Seo),
            "aeo" => Ok(Pillar::Aeo),
            "geo" => Ok(Pillar::Geo),
            _ => Err(ScoreError::UnknownPillar {
                name: s.to_string(),
            }),
        }
    }
}

/// Weight quadruple over `{mentions, citations, sentiment, shareOfVoice}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PillarWeights {
    pub mentions: f64,
    pub citations: f64,
    pub sentiment: f64,
    pub share_of_voice: f64,
}

impl PillarWeights {
    /// Classic search leans on links and share of the results page.
    pub const SEO: PillarWeights = PillarWeights {
        mentions: 0.20,
        citations: 0.30,
        sentiment: 0.20,
        share_of_voice: 0.30,
    };
    /// Answer engines reward being named in the answer itself.
    pub const AEO: PillarWeights = PillarWeights {
        mentions: 0.35,
        citations: 0.30,
        sentiment: 0.15,
        share_of_voice: 0.20,
    };
    pub const GEO: PillarWeights = PillarWeights {
        mentions: 0.30,
        citations: 0.20,
        sentiment: 0.20,
        share_of_voice: 0.30,
    };

    pub fn total(&self) -> f64 {
        self.mentions + self.citations + self.sentiment + self.share_of_voice
    }
}

/// Blend a pillar's sub-metrics into a 0–100 score.
pub fn score_composite(metrics: &MetricBlock, pillar: Pillar) -> f64 {
    let w = pillar.weights();
    clamp_score(weighted_sum(&[
        (metrics.mentions, w.mentions),
        (metrics.citations, w.citations),
        (metrics.sentiment, w.sentiment),
        (metrics.share_of_voice, w.share_of_voice),
    ]))
}

/// Raw per-engine visibility scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineCoverage {
    #[serde(default)]
    pub perplexity: f64,
    #[serde(default)]
    pub chatgpt: f64,
    #[serde(default)]
    pub gemini: f64,
}

impl EngineCoverage {
    pub fn get(&self, engine: Engine) -> f64 {
        match engine {
            Engine::Perplexity => self.perplexity,
            Engine::ChatGpt => self.chatgpt,
            Engine::Gemini => self.gemini,
        }
    }
}

/// AI visibility with the built-in engine weights.
pub fn score_ai_visibility(coverage: &EngineCoverage) -> f64 {
    score_ai_visibility_with(coverage, &EngineWeights::DEFAULT)
}

/// AI visibility with an injected engine weight table.
pub fn score_ai_visibility_with(coverage: &EngineCoverage, weights: &EngineWeights) -> f64 {
    let pairs = Engine::ALL.map(|e| (coverage.get(e), weights.weight_for(e)));
    clamp_score(weighted_sum(&pairs))
}
