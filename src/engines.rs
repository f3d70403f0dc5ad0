//! # Engines
//!
//! The fixed universe of AI answer engines we track (Perplexity, ChatGPT,
//! Gemini) and the importance weight of each.
//!
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings/vendor names to the canonical engine.
//! - One weight table (`EngineWeights`) is shared by the AI-visibility scorer
//!   and the consensus detector.

use serde::{Deserialize, Serialize};

/// A known answer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Perplexity,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Gemini,
}

impl Engine {
    /// Fixed iteration order used for every weighted sum.
    pub const ALL: [Engine; 3] = [Engine::Perplexity, Engine::ChatGpt, Engine::Gemini];

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Perplexity => "perplexity",
            Engine::ChatGpt => "chatgpt",
            Engine::Gemini => "gemini",
        }
    }

    /// Resolve a raw engine label.
    ///
    /// Steps:
    /// 1. Normalize (lowercase, dashes/punctuation → spaces, collapse spaces).
    /// 2. Canonical name match.
    /// 3. Alias match.
    ///
    /// Returns `None` for engines outside the fixed universe.
    pub fn parse(raw: &str) -> Option<Engine> {
        let s = normalize(raw);
        match s.as_str() {
            "perplexity" => Some(Engine::Perplexity),
            "chatgpt" => Some(Engine::ChatGpt),
            "gemini" => Some(Engine::Gemini),
            _ => ALIASES
                .iter()
                .find(|(alias, _)| *alias == s)
                .map(|(_, engine)| *engine),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALIASES: &[(&str, Engine)] = &[
    ("chat gpt", Engine::ChatGpt),
    ("openai", Engine::ChatGpt),
    ("gpt", Engine::ChatGpt),
    ("gpt 4", Engine::ChatGpt),
    ("gpt 4o", Engine::ChatGpt),
    ("google gemini", Engine::Gemini),
    ("bard", Engine::Gemini),
    ("google bard", Engine::Gemini),
    ("perplexity ai", Engine::Perplexity),
    ("pplx", Engine::Perplexity),
];

/// Importance weight per engine. Sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineWeights {
    #[serde(default = "default_chatgpt")]
    pub chatgpt: f64,
    #[serde(default = "default_gemini")]
    pub gemini: f64,
    #[serde(default = "default_perplexity")]
    pub perplexity: f64,
}

fn default_chatgpt() -> f64 {
    EngineWeights::DEFAULT.chatgpt
}
fn default_gemini() -> f64 {
    EngineWeights::DEFAULT.gemini
}
fn default_perplexity() -> f64 {
    EngineWeights::DEFAULT.perplexity
}

impl Default for EngineWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl EngineWeights {
    pub const DEFAULT: EngineWeights = EngineWeights {
        chatgpt: 0.40,
        gemini: 0.35,
        perplexity: 0.25,
    };

    pub fn weight_for(&self, engine: Engine) -> f64 {
        match engine {
            Engine::Perplexity => self.perplexity,
            Engine::ChatGpt => self.chatgpt,
            Engine::Gemini => self.gemini,
        }
    }

    /// Rescale so the three weights sum to 1.0.
    /// Negative or non-finite entries count as 0; if nothing positive is
    /// left, the built-in defaults are returned.
    pub fn normalized(&self) -> Self {
        let c = non_negative(self.chatgpt);
        let g = non_negative(self.gemini);
        let p = non_negative(self.perplexity);
        let sum = c + g + p;
        if sum <= f64::EPSILON {
            return Self::DEFAULT;
        }
        Self {
            chatgpt: c / sum,
            gemini: g / sum,
            perplexity: p / sum,
        }
    }

    pub fn total(&self) -> f64 {
        Engine::ALL.iter().map(|e| self.weight_for(*e)).sum()
    }
}

fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Normalize input string: lowercase, replace punctuation/dashes with spaces,
/// collapse multiple spaces into one.
pub(crate) fn normalize(s: &str) -> String {
    let mut out = s.trim().to_ascii_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }
    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
