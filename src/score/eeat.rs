//! EEAT: four boolean trust signals, 25 points each.

use serde::{Deserialize, Serialize};

/// Presence of Experience, Expertise, Authoritativeness and Trust signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EeatFlags {
    #[serde(default)]
    pub exp: bool,
    #[serde(default)]
    pub expx: bool,
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub trust: bool,
}

impl EeatFlags {
    pub const SIGNALS: u32 = 4;

    pub fn all() -> Self {
        Self {
            exp: true,
            expx: true,
            auth: true,
            trust: true,
        }
    }

    /// Number of signals present (0..=4).
    pub fn count(&self) -> u32 {
        [self.exp, self.expx, self.auth, self.trust]
            .iter()
            .filter(|f| **f)
            .count() as u32
    }
}

/// Exactly `25 × count`; the domain is inherently 0/25/50/75/100.
pub fn score_eeat(flags: &EeatFlags) -> f64 {
    25.0 * flags.count() as f64
}
