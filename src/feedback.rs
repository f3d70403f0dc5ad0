//! # Forecast Feedback Loop
//! Recalibrates a rolling confidence score from observed forecast error,
//! user behaviour and outcome trends.
//!
//! Pure and stateless: the caller passes the previous confidence in and
//! persists the returned `new_confidence_score` for the next run.
//!
//! Pipeline (order matters, later steps use earlier values):
//! 1. mean relative forecast error over completed records
//! 2. `error_weight = |avg|` and its category (minor / moderate / major)
//! 3. base adjustment `1 - 0.75 × error_weight`
//! 4. behavioural reinforcement (45%)
//! 5. performance reinforcement (40%)
//! 6. contextual decay (15%)
//! 7. weighted adjustment × base adjustment
//! 8. `new = clamp(previous × adjustment, 0, 1)`
//! 9. recommendations
//!
//! The revised confidence is also bucketed into a `ConfidenceTier` and
//! turned into an ROI forecast multiplier (`0.95 + 0.12 × confidence`).

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::score::{clamp01, finite_or_zero};

/// Error bands on `|avg error|`.
const MINOR_ERROR_MAX: f64 = 0.05;
const MODERATE_ERROR_MAX: f64 = 0.10;

const ERROR_PENALTY: f64 = 0.75;

const BEHAVIORAL_BASE: f64 = 0.30;
const BEHAVIORAL_CAP: f64 = 0.60;
const ENGAGEMENT_MAX_BOOST: f64 = 0.15;
const ALERT_ACK_MAX_BOOST: f64 = 0.10;
const FOLLOW_THROUGH_MAX_BOOST: f64 = 0.10;
const RESPONSE_TIME_MAX_BOOST: f64 = 0.10;
/// Response-time boost decays linearly to 0 at this many hours.
const RESPONSE_TIME_HORIZON_HOURS: f64 = 24.0;

const PERFORMANCE_BASE: f64 = 0.30;
const PERFORMANCE_CAP: f64 = 0.50;
const TREND_IMPROVEMENT_MAX_BOOST: f64 = 0.10;
const OUTCOME_SIGNAL_MAX_BOOST: f64 = 0.05;
/// Loss reduction that earns the full boost, in dollars.
const LOSS_REDUCTION_REFERENCE: f64 = 20_000.0;

const CONTEXTUAL_DECAY: f64 = 0.85;

/// Tier floors on the revised confidence.
const HIGH_CONFIDENCE_MIN: f64 = 0.85;
const MEDIUM_CONFIDENCE_MIN: f64 = 0.70;

/// ROI forecast multiplier spans 0.95 (no confidence) to 1.07 (full).
const ROI_MULTIPLIER_BASE: f64 = 0.95;
const ROI_MULTIPLIER_SLOPE: f64 = 0.12;

const W_BEHAVIORAL: f64 = 0.45;
const W_PERFORMANCE: f64 = 0.40;
const W_CONTEXTUAL: f64 = 0.15;

/// Default forecast window.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

/// One forecast and (once its window has elapsed) its observed outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub predicted_roi: f64,
    /// `None` until the forecast window has elapsed.
    #[serde(default)]
    pub actual_roi: Option<f64>,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    pub date: NaiveDate,
}

impl ForecastRecord {
    pub fn new(predicted_roi: f64, role: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            predicted_roi,
            actual_roi: None,
            role: role.into(),
            window_days: DEFAULT_WINDOW_DAYS,
            date,
        }
    }

    pub fn with_window(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_actual(mut self, actual_roi: f64) -> Self {
        self.actual_roi = Some(actual_roi);
        self
    }

    /// First day on which the outcome may be recorded.
    pub fn due_date(&self) -> NaiveDate {
        self.date
            .checked_add_days(Days::new(u64::from(self.window_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn is_completed(&self) -> bool {
        self.actual_roi.is_some()
    }

    /// `(predicted - actual) / predicted`; 0 when predicted is 0 or the
    /// outcome is missing. Overflow saturates to `±f64::MAX`.
    pub fn relative_error(&self) -> f64 {
        let predicted = finite_or_zero(self.predicted_roi);
        match self.actual_roi {
            Some(actual) if predicted != 0.0 => {
                saturate((predicted - finite_or_zero(actual)) / predicted)
            }
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    #[default]
    Stable,
    Declining,
}

impl TrendDirection {
    pub fn multiplier(self) -> f64 {
        match self {
            TrendDirection::Improving => 1.0,
            TrendDirection::Stable => 0.8,
            TrendDirection::Declining => 0.5,
        }
    }
}

/// Behavioural and outcome signals for the evaluation period.
///
/// Rates and trends are fractions (`0.12` = 12%); response time is in hours;
/// `DLOC_reduction` is in dollars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInputs {
    #[serde(default)]
    pub engagement_velocity: f64,
    #[serde(default)]
    pub alert_ack_rate: f64,
    #[serde(default)]
    pub action_follow_through_rate: f64,
    #[serde(default)]
    pub avg_response_time_hours: f64,
    #[serde(default, rename = "DPI_trend")]
    pub dpi_trend: f64,
    #[serde(default, rename = "LEE_change")]
    pub lee_change: f64,
    #[serde(default, rename = "DLOC_reduction")]
    pub dloc_reduction: f64,
    #[serde(default)]
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Minor,
    Moderate,
    Major,
}

impl ErrorCategory {
    /// minor `< 5%`, moderate `5%..=10%`, major `> 10%`.
    pub fn from_error_weight(w: f64) -> Self {
        if w < MINOR_ERROR_MAX {
            ErrorCategory::Minor
        } else if w <= MODERATE_ERROR_MAX {
            ErrorCategory::Moderate
        } else {
            ErrorCategory::Major
        }
    }

    fn recommendations(self) -> &'static [&'static str] {
        match self {
            ErrorCategory::Minor => &[
                "Forecast accuracy is within tolerance; maintain current methodology",
            ],
            ErrorCategory::Moderate => &[
                "Review forecast assumptions for the affected roles",
                "Recalibrate elasticity coefficients against recent outcomes",
            ],
            ErrorCategory::Major => &[
                "Immediate model review required",
                "Validate input data sources and collection windows",
                "Engage deeper analysis of forecast drivers before the next cycle",
            ],
        }
    }
}

/// Dashboard bucket for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// high `>= 0.85`, medium `>= 0.70`, low otherwise.
    pub fn from_confidence(c: f64) -> Self {
        if c >= HIGH_CONFIDENCE_MIN {
            ConfidenceTier::High
        } else if c >= MEDIUM_CONFIDENCE_MIN {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// Scale applied to ROI forecasts at a given confidence: 0.95..=1.07.
pub fn roi_confidence_multiplier(confidence: f64) -> f64 {
    ROI_MULTIPLIER_BASE + ROI_MULTIPLIER_SLOPE * clamp01(confidence)
}

/// Everything the recalibration computed, for display and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLoopResult {
    pub previous_confidence_score: f64,
    pub new_confidence_score: f64,
    pub confidence_delta: f64,
    pub avg_forecast_error: f64,
    pub error_weight: f64,
    pub error_category: ErrorCategory,
    pub base_adjustment_factor: f64,
    pub behavioral_reinforcement: f64,
    pub performance_reinforcement: f64,
    pub contextual_decay: f64,
    pub weighted_adjustment: f64,
    pub adjustment_factor: f64,
    pub records_evaluated: usize,
    pub records_skipped: usize,
    pub confidence_tier: ConfidenceTier,
    pub roi_forecast_confidence_multiplier: f64,
    pub recommendations: Vec<String>,
}

/// Recalibrate confidence from a batch of forecast records.
///
/// Records without an outcome are skipped. With nothing to evaluate the
/// previous confidence is carried forward unchanged.
pub fn calculate_feedback_loop(
    records: &[ForecastRecord],
    perf: &PerformanceInputs,
    previous_confidence: f64,
) -> FeedbackLoopResult {
    let previous = clamp01(previous_confidence);
    let completed: Vec<&ForecastRecord> = records.iter().filter(|r| r.is_completed()).collect();
    let skipped = records.len() - completed.len();

    if completed.is_empty() {
        tracing::debug!(
            skipped,
            previous,
            "feedback loop: no completed forecasts, confidence carried forward"
        );
        return carry_forward(previous, skipped);
    }

    // (1) mean relative error, input order
    let avg_error = saturate(
        completed.iter().map(|r| r.relative_error()).sum::<f64>() / completed.len() as f64,
    );

    // (2) magnitude and category
    let error_weight = avg_error.abs();
    let category = ErrorCategory::from_error_weight(error_weight);

    // (3) base adjustment
    let base_adjustment = 1.0 - error_weight * ERROR_PENALTY;

    // (4)-(6) reinforcement components
    let behavioral = behavioral_reinforcement(perf);
    let performance = performance_reinforcement(perf, error_weight);
    let contextual = CONTEXTUAL_DECAY;

    // (7) blend
    let weighted =
        W_BEHAVIORAL * behavioral + W_PERFORMANCE * performance + W_CONTEXTUAL * contextual;
    let adjustment = base_adjustment * weighted;

    // (8) new confidence
    let new_confidence = clamp01(previous * adjustment);

    tracing::debug!(
        records = completed.len(),
        skipped,
        avg_error,
        category = ?category,
        adjustment,
        previous,
        new_confidence,
        "feedback loop recalibrated"
    );

    // (9) recommendations
    let mut recommendations: Vec<String> = category
        .recommendations()
        .iter()
        .map(|s| s.to_string())
        .collect();
    recommendations.push(format!(
        "Average forecast error {:+.1}% over {} completed forecast(s) ({:?})",
        avg_error * 100.0,
        completed.len(),
        category
    ));
    recommendations.push(format!(
        "Confidence adjusted from {:.3} to {:.3} (base {:.3} x weighted {:.3} = factor {:.3})",
        previous, new_confidence, base_adjustment, weighted, adjustment
    ));
    if skipped > 0 {
        recommendations.push(format!(
            "{skipped} forecast(s) without recorded outcome were not evaluated"
        ));
    }

    FeedbackLoopResult {
        previous_confidence_score: previous,
        new_confidence_score: new_confidence,
        confidence_delta: new_confidence - previous,
        avg_forecast_error: avg_error,
        error_weight,
        error_category: category,
        base_adjustment_factor: base_adjustment,
        behavioral_reinforcement: behavioral,
        performance_reinforcement: performance,
        contextual_decay: contextual,
        weighted_adjustment: weighted,
        adjustment_factor: adjustment,
        records_evaluated: completed.len(),
        records_skipped: skipped,
        confidence_tier: ConfidenceTier::from_confidence(new_confidence),
        roi_forecast_confidence_multiplier: roi_confidence_multiplier(new_confidence),
        recommendations,
    }
}

/// Base 0.3, up to +0.45 from engagement, acknowledgement, follow-through
/// and response speed; capped at 0.6.
pub fn behavioral_reinforcement(perf: &PerformanceInputs) -> f64 {
    let hours = finite_or_zero(perf.avg_response_time_hours).max(0.0);
    let speed = clamp01(1.0 - hours / RESPONSE_TIME_HORIZON_HOURS);

    let raw = BEHAVIORAL_BASE
        + ENGAGEMENT_MAX_BOOST * clamp01(perf.engagement_velocity)
        + ALERT_ACK_MAX_BOOST * clamp01(perf.alert_ack_rate)
        + FOLLOW_THROUGH_MAX_BOOST * clamp01(perf.action_follow_through_rate)
        + RESPONSE_TIME_MAX_BOOST * speed;
    raw.min(BEHAVIORAL_CAP)
}

/// Base 0.3 plus trend improvement and outcome signals, scaled by trend
/// direction; capped at 0.5.
pub fn performance_reinforcement(perf: &PerformanceInputs, error_weight: f64) -> f64 {
    let trend_improvement = clamp01(1.0 - error_weight);
    let loss_reduction = clamp01(finite_or_zero(perf.dloc_reduction) / LOSS_REDUCTION_REFERENCE);

    let raw = PERFORMANCE_BASE
        + TREND_IMPROVEMENT_MAX_BOOST * trend_improvement
        + OUTCOME_SIGNAL_MAX_BOOST * clamp01(perf.dpi_trend)
        + OUTCOME_SIGNAL_MAX_BOOST * clamp01(perf.lee_change)
        + OUTCOME_SIGNAL_MAX_BOOST * loss_reduction;
    (raw * perf.trend_direction.multiplier()).min(PERFORMANCE_CAP)
}

fn carry_forward(previous: f64, skipped: usize) -> FeedbackLoopResult {
    let mut recommendations = vec![
        "No completed forecasts in this window; confidence carried forward unchanged".to_string(),
    ];
    if skipped > 0 {
        recommendations.push(format!(
            "{skipped} forecast(s) are still awaiting outcomes"
        ));
    }

    FeedbackLoopResult {
        previous_confidence_score: previous,
        new_confidence_score: previous,
        confidence_delta: 0.0,
        avg_forecast_error: 0.0,
        error_weight: 0.0,
        error_category: ErrorCategory::Minor,
        base_adjustment_factor: 1.0,
        behavioral_reinforcement: 0.0,
        performance_reinforcement: 0.0,
        contextual_decay: CONTEXTUAL_DECAY,
        weighted_adjustment: 1.0,
        adjustment_factor: 1.0,
        records_evaluated: 0,
        records_skipped: skipped,
        confidence_tier: ConfidenceTier::from_confidence(previous),
        roi_forecast_confidence_multiplier: roi_confidence_multiplier(previous),
        recommendations,
    }
}

/// Finite stand-in for an overflowed ratio; NaN counts as no error.
fn saturate(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-f64::MAX, f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(predicted: f64, actual: f64) -> ForecastRecord {
        ForecastRecord::new(predicted, "gm", day("2025-01-01")).with_actual(actual)
    }

    fn strong_perf() -> PerformanceInputs {
        PerformanceInputs {
            engagement_velocity: 1.0,
            alert_ack_rate: 1.0,
            action_follow_through_rate: 1.0,
            avg_response_time_hours: 0.0,
            dpi_trend: 1.0,
            lee_change: 1.0,
            dloc_reduction: 40_000.0,
            trend_direction: TrendDirection::Improving,
        }
    }

    #[test]
    fn error_bands() {
        assert_eq!(ErrorCategory::from_error_weight(0.0), ErrorCategory::Minor);
        assert_eq!(ErrorCategory::from_error_weight(0.049), ErrorCategory::Minor);
        assert_eq!(ErrorCategory::from_error_weight(0.05), ErrorCategory::Moderate);
        assert_eq!(ErrorCategory::from_error_weight(0.10), ErrorCategory::Moderate);
        assert_eq!(ErrorCategory::from_error_weight(0.1001), ErrorCategory::Major);
    }

    #[test]
    fn zero_prediction_has_zero_error() {
        assert_eq!(rec(0.0, 5.0).relative_error(), 0.0);
    }

    #[test]
    fn relative_error_sign() {
        assert!((rec(100.0, 90.0).relative_error() - 0.10).abs() < 1e-12);
        assert!((rec(100.0, 110.0).relative_error() + 0.10).abs() < 1e-12);
    }

    #[test]
    fn behavioral_is_capped() {
        assert!((behavioral_reinforcement(&strong_perf()) - 0.6).abs() < 1e-12);
        assert!((behavioral_reinforcement(&PerformanceInputs {
            avg_response_time_hours: 48.0,
            ..Default::default()
        }) - 0.3)
            .abs()
            < 1e-12);
    }

    #[test]
    fn response_time_boost_decays() {
        let fast = behavioral_reinforcement(&PerformanceInputs {
            avg_response_time_hours: 1.0,
            ..Default::default()
        });
        let slow = behavioral_reinforcement(&PerformanceInputs {
            avg_response_time_hours: 20.0,
            ..Default::default()
        });
        assert!(fast > slow);
    }

    #[test]
    fn performance_capped_and_scaled_by_trend() {
        assert!((performance_reinforcement(&strong_perf(), 0.0) - 0.5).abs() < 1e-12);
        let declining = PerformanceInputs {
            trend_direction: TrendDirection::Declining,
            ..strong_perf()
        };
        // (0.3 + 0.1 + 0.05 × 3) × 0.5
        assert!((performance_reinforcement(&declining, 0.0) - 0.275).abs() < 1e-12);
    }

    #[test]
    fn exact_pipeline_for_perfect_forecasts() {
        let r = calculate_feedback_loop(&[rec(100.0, 100.0)], &strong_perf(), 0.9);
        // weighted = 0.45×0.6 + 0.40×0.5 + 0.15×0.85 = 0.5975
        assert!((r.weighted_adjustment - 0.5975).abs() < 1e-12);
        assert!((r.base_adjustment_factor - 1.0).abs() < 1e-12);
        assert!((r.new_confidence_score - 0.9 * 0.5975).abs() < 1e-12);
        assert_eq!(r.error_category, ErrorCategory::Minor);
        assert!(r.recommendations[0].contains("maintain"));
    }

    #[test]
    fn major_error_shrinks_more() {
        let small = calculate_feedback_loop(&[rec(100.0, 98.0)], &strong_perf(), 0.8);
        let big = calculate_feedback_loop(&[rec(100.0, 60.0)], &strong_perf(), 0.8);
        assert_eq!(big.error_category, ErrorCategory::Major);
        assert!(big.new_confidence_score < small.new_confidence_score);
        assert!(big
            .recommendations
            .iter()
            .any(|r| r.contains("Immediate model review")));
    }

    #[test]
    fn empty_input_is_identity() {
        let r = calculate_feedback_loop(&[], &strong_perf(), 0.89);
        assert_eq!(r.new_confidence_score, 0.89);
        assert_eq!(r.error_category, ErrorCategory::Minor);
        assert!(!r.recommendations.is_empty());
    }

    #[test]
    fn incomplete_records_are_skipped() {
        let pending = ForecastRecord::new(100.0, "gm", day("2025-03-01"));
        let r = calculate_feedback_loop(&[pending.clone()], &strong_perf(), 0.7);
        assert_eq!(r.new_confidence_score, 0.7);
        assert_eq!(r.records_skipped, 1);

        let r2 = calculate_feedback_loop(&[pending, rec(100.0, 100.0)], &strong_perf(), 0.7);
        assert_eq!(r2.records_evaluated, 1);
        assert_eq!(r2.records_skipped, 1);
    }

    #[test]
    fn huge_error_clamps_to_zero() {
        let r = calculate_feedback_loop(&[rec(1.0, 50.0)], &strong_perf(), 1.0);
        assert_eq!(r.new_confidence_score, 0.0);
    }

    #[test]
    fn overflowing_error_is_a_major_miss() {
        let r = rec(1e-308, 10.0);
        assert_eq!(r.relative_error(), -f64::MAX);
        assert_eq!(rec(-1e-308, 10.0).relative_error(), f64::MAX);

        let res = calculate_feedback_loop(&[r], &strong_perf(), 0.9);
        assert_eq!(res.avg_forecast_error, -f64::MAX);
        assert_eq!(res.error_category, ErrorCategory::Major);
        assert_eq!(res.new_confidence_score, 0.0);
        assert_eq!(res.confidence_tier, ConfidenceTier::Low);
        assert!(res.recommendations[0].contains("Immediate model review"));
    }

    #[test]
    fn overflowing_mean_stays_finite() {
        let res = calculate_feedback_loop(
            &[rec(1e-308, 10.0), rec(1e-308, 10.0)],
            &strong_perf(),
            0.9,
        );
        assert!(res.avg_forecast_error.is_finite());
        assert_eq!(res.error_category, ErrorCategory::Major);
    }

    #[test]
    fn confidence_tier_boundaries() {
        assert_eq!(ConfidenceTier::from_confidence(1.0), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.85), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.8499), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.70), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.6999), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_confidence(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn roi_multiplier_range() {
        assert!((roi_confidence_multiplier(0.0) - 0.95).abs() < 1e-12);
        assert!((roi_confidence_multiplier(1.0) - 1.07).abs() < 1e-12);
        assert!((roi_confidence_multiplier(0.84) - 1.0508).abs() < 1e-12);
        assert!((roi_confidence_multiplier(5.0) - 1.07).abs() < 1e-12);
    }

    #[test]
    fn result_carries_tier_and_multiplier() {
        let kept = calculate_feedback_loop(&[], &strong_perf(), 0.89);
        assert_eq!(kept.confidence_tier, ConfidenceTier::High);
        assert!((kept.roi_forecast_confidence_multiplier - (0.95 + 0.12 * 0.89)).abs() < 1e-12);

        // 0.9 × 0.5975 = 0.53775
        let r = calculate_feedback_loop(&[rec(100.0, 100.0)], &strong_perf(), 0.9);
        assert_eq!(r.confidence_tier, ConfidenceTier::Low);
        assert!(
            (r.roi_forecast_confidence_multiplier - (0.95 + 0.12 * r.new_confidence_score)).abs()
                < 1e-12
        );
    }

    #[test]
    fn due_date_adds_window() {
        let r = ForecastRecord::new(1.0, "gm", day("2025-01-01"));
        assert_eq!(r.due_date(), day("2025-01-31"));
        assert_eq!(r.with_window(7).due_date(), day("2025-01-08"));
    }

    #[test]
    fn json_field_names() {
        let perf: PerformanceInputs = serde_json::from_str(
            r#"{"engagement_velocity":0.5,"DPI_trend":0.1,"LEE_change":0.05,
                "DLOC_reduction":12000,"trend_direction":"improving"}"#,
        )
        .unwrap();
        assert!((perf.dpi_trend - 0.1).abs() < 1e-12);
        assert_eq!(perf.trend_direction, TrendDirection::Improving);

        let r = calculate_feedback_loop(&[rec(100.0, 95.0)], &perf, 0.5);
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("new_confidence_score").is_some());
        assert_eq!(v["error_category"], serde_json::json!("moderate"));
    }
}
