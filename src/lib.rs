// src/lib.rs
// Public library surface for the binary, integration tests and other callers.

// Pure scoring core (no I/O, no shared state)
pub mod alert;
pub mod consensus;
pub mod engines;
pub mod feedback;
pub mod revenue;
pub mod score;

// Service glue
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::alert::{get_metric_alert, get_metric_alert_str, AlertLevel, MetricKey};
pub use crate::api::router;
pub use crate::consensus::{consensus, ConsensusResult, IssueHit};
pub use crate::engines::{Engine, EngineWeights};
pub use crate::error::ScoreError;
pub use crate::feedback::{
    calculate_feedback_loop, ConfidenceTier, ErrorCategory, FeedbackLoopResult, ForecastRecord,
    PerformanceInputs, TrendDirection,
};
pub use crate::revenue::{rar_cpc, CpcTable, MissedClicks};
pub use crate::score::{
    score_ai_visibility, score_composite, score_eeat, score_mystery, score_overall,
    score_website_health,
};
