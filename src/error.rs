//! Error taxonomy.
//!
//! The scorers themselves never fail: bad numbers are clamped or zeroed.
//! Errors only come from parsing caller-supplied identifiers (an unknown
//! pillar or metric key is a caller bug), from alert policy overrides and
//! from the forecast log.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("unknown pillar: {name} (expected seo, aeo or geo)")]
    UnknownPillar { name: String },

    #[error("unknown metric key: {key}")]
    UnknownMetric { key: String },

    #[error("alert policy for {key} must use the {expected} scale, got {got}")]
    ScaleMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("alert policy for {key} must keep count max {max}")]
    CountMaxFixed { key: String, max: u32 },

    #[error("forecast not found: {id}")]
    UnknownForecast { id: u64 },

    #[error("forecast {id} already has an outcome")]
    OutcomeAlreadyRecorded { id: u64 },

    #[error("forecast {id} window still open until {due}")]
    WindowOpen { id: u64, due: chrono::NaiveDate },
}

impl ScoreError {
    /// True for errors that mean "no such resource" rather than a bad request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScoreError::UnknownForecast { .. })
    }
}
