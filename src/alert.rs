//! # Metric Alerts
//! Traffic-light tier for a metric value.
//!
//! Two threshold regimes, chosen by metric key and never by magnitude:
//! - `Percentage`: 0–100 scores (seo, aeo, geo, ...) against green/yellow
//!   cut points specific to each metric.
//! - `Count`: raw signal counts (eeat) against the maximum count; green at
//!   the maximum, yellow one below, red otherwise.
//!
//! So `75` for `seo` is a percentage, while `3` for `eeat` means "3 of 4
//! signals". Percentage cut points are configurable; the defaults live in
//! `AlertThresholds::default()`. A metric's regime is fixed, and the count
//! maximum is pinned to the number of EEAT signals.

use std::collections::BTreeMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::score::{EeatFlags, Pillar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Green,
    Yellow,
    Red,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Green => "green",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Red => "red",
        }
    }
}

/// Metrics that can be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKey {
    Seo,
    Aeo,
    Geo,
    /// AI visibility.
    Ai,
    /// Website health.
    Wh,
    Mystery,
    Overall,
    Eeat,
}

impl MetricKey {
    pub const ALL: [MetricKey; 8] = [
        MetricKey::Seo,
        MetricKey::Aeo,
        MetricKey::Geo,
        MetricKey::Ai,
        MetricKey::Wh,
        MetricKey::Mystery,
        MetricKey::Overall,
        MetricKey::Eeat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::Seo => "seo",
            MetricKey::Aeo => "aeo",
            MetricKey::Geo => "geo",
            MetricKey::Ai => "ai",
            MetricKey::Wh => "wh",
            MetricKey::Mystery => "mystery",
            MetricKey::Overall => "overall",
            MetricKey::Eeat => "eeat",
        }
    }
}

impl From<Pillar> for MetricKey {
    fn from(p: Pillar) -> Self {
        match p {
            Pillar::Seo => MetricKey::Seo,
            Pillar::Aeo => MetricKey::Aeo,
            Pillar::Geo => MetricKey::Geo,
        }
    }
}

impl FromStr for MetricKey {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let k = s.trim().to_ascii_lowercase();
        MetricKey::ALL
            .into_iter()
            .find(|m| m.as_str() == k)
            .ok_or_else(|| ScoreError::UnknownMetric { key: s.to_string() })
    }
}

/// How a metric's value maps to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scale", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// `value >= green` → green, `value >= yellow` → yellow, else red.
    Percentage { green: f64, yellow: f64 },
    /// `value >= max` → green, `value >= max - 1` → yellow, else red.
    Count { max: u32 },
}

impl ThresholdPolicy {
    /// Regime name, as serialized in the `scale` tag.
    pub fn scale(&self) -> &'static str {
        match self {
            ThresholdPolicy::Percentage { .. } => "percentage",
            ThresholdPolicy::Count { .. } => "count",
        }
    }

    pub fn classify(&self, value: f64) -> AlertLevel {
        match *self {
            ThresholdPolicy::Percentage { green, yellow } => {
                if value >= green {
                    AlertLevel::Green
                } else if value >= yellow {
                    AlertLevel::Yellow
                } else {
                    AlertLevel::Red
                }
            }
            ThresholdPolicy::Count { max } => {
                if value >= max as f64 {
                    AlertLevel::Green
                } else if value >= max.saturating_sub(1) as f64 {
                    AlertLevel::Yellow
                } else {
                    AlertLevel::Red
                }
            }
        }
    }

    /// Keep a valid band: swap inverted cut points, drop non-finite ones.
    pub fn sanitized(self, fallback: ThresholdPolicy) -> Self {
        match self {
            ThresholdPolicy::Percentage { green, yellow } => {
                if !green.is_finite() || !yellow.is_finite() {
                    return fallback;
                }
                if yellow > green {
                    ThresholdPolicy::Percentage {
                        green: yellow,
                        yellow: green,
                    }
                } else {
                    self
                }
            }
            ThresholdPolicy::Count { max } if max == 0 => fallback,
            other => other,
        }
    }
}

/// Metric key → threshold policy.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    policies: BTreeMap<MetricKey, ThresholdPolicy>,
}

static DEFAULT_THRESHOLDS: Lazy<AlertThresholds> = Lazy::new(AlertThresholds::default);

impl Default for AlertThresholds {
    fn default() -> Self {
        let pct = |green, yellow| ThresholdPolicy::Percentage { green, yellow };
        let policies = BTreeMap::from([
            (MetricKey::Seo, pct(85.0, 60.0)),
            (MetricKey::Aeo, pct(80.0, 55.0)),
            (MetricKey::Geo, pct(75.0, 50.0)),
            (MetricKey::Ai, pct(80.0, 55.0)),
            (MetricKey::Wh, pct(80.0, 60.0)),
            (MetricKey::Mystery, pct(75.0, 50.0)),
            (MetricKey::Overall, pct(80.0, 60.0)),
            (
                MetricKey::Eeat,
                ThresholdPolicy::Count {
                    max: EeatFlags::SIGNALS,
                },
            ),
        ]);
        Self { policies }
    }
}

impl AlertThresholds {
    pub fn policy(&self, key: MetricKey) -> ThresholdPolicy {
        self.policies
            .get(&key)
            .copied()
            .unwrap_or_else(|| DEFAULT_THRESHOLDS.policies[&key])
    }

    /// Replace one metric's policy (sanitized against the current one).
    ///
    /// The regime must match the metric's built-in one, and a count policy
    /// must keep the built-in maximum.
    pub fn set(&mut self, key: MetricKey, policy: ThresholdPolicy) -> Result<(), ScoreError> {
        let builtin = DEFAULT_THRESHOLDS.policy(key);
        if policy.scale() != builtin.scale() {
            return Err(ScoreError::ScaleMismatch {
                key: key.as_str().to_string(),
                expected: builtin.scale(),
                got: policy.scale(),
            });
        }
        if let (ThresholdPolicy::Count { max }, ThresholdPolicy::Count { max: fixed }) =
            (policy, builtin)
        {
            if max != fixed {
                return Err(ScoreError::CountMaxFixed {
                    key: key.as_str().to_string(),
                    max: fixed,
                });
            }
        }

        let current = self.policy(key);
        self.policies.insert(key, policy.sanitized(current));
        Ok(())
    }

    pub fn classify(&self, key: MetricKey, value: f64) -> AlertLevel {
        self.policy(key).classify(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, ThresholdPolicy)> + '_ {
        self.policies.iter().map(|(k, p)| (*k, *p))
    }
}

/// Classify with the default thresholds.
pub fn get_metric_alert(key: MetricKey, value: f64) -> AlertLevel {
    DEFAULT_THRESHOLDS.classify(key, value)
}

/// Classify by raw key string; an unknown key is a caller bug.
pub fn get_metric_alert_str(key: &str, value: f64) -> Result<AlertLevel, ScoreError> {
    Ok(get_metric_alert(key.parse()?, value))
}
