//! # Revenue at Risk
//! Missed clicks per category × cost-per-click proxy = dollars at risk.
//!
//! Rates come from a caller override when present, else the built-in table.
//! Unknown categories cost nothing. There is no upper bound short of
//! `f64::MAX`, where the total saturates.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Category → missed click count. `BTreeMap` keeps summation order fixed.
pub type MissedClicks = BTreeMap<String, f64>;

/// Built-in dollar-per-click proxies.
static DEFAULT_CPC: Lazy<BTreeMap<&'static str, f64>> = Lazy::new(|| {
    BTreeMap::from([
        ("buy", 14.0),
        ("sell", 10.0),
        ("service", 6.0),
        ("trade", 12.0),
    ])
});

/// CPC rates: built-in defaults plus per-category overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpcTable {
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl CpcTable {
    pub fn with_overrides(overrides: BTreeMap<String, f64>) -> Self {
        Self { overrides }
    }

    /// Override → default → 0. Category names are matched case-insensitively.
    pub fn rate_for(&self, category: &str) -> f64 {
        let key = category.trim().to_ascii_lowercase();
        let rate = self
            .overrides
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(&key))
            .map(|(_, r)| *r)
            .or_else(|| DEFAULT_CPC.get(key.as_str()).copied())
            .unwrap_or(0.0);
        non_negative(rate)
    }

    /// Layer `other`'s overrides on top of ours.
    pub fn merged(&self, other: &BTreeMap<String, f64>) -> Self {
        let mut overrides = self.overrides.clone();
        for (k, v) in other {
            overrides.retain(|existing, _| !existing.eq_ignore_ascii_case(k));
            overrides.insert(k.clone(), *v);
        }
        Self { overrides }
    }

    /// Dollar estimate for a set of missed clicks. Saturates at `f64::MAX`.
    pub fn revenue_at_risk(&self, missed: &MissedClicks) -> f64 {
        missed
            .iter()
            .map(|(category, count)| non_negative(*count) * self.rate_for(category))
            .sum::<f64>()
            .min(f64::MAX)
    }
}

/// Built-in default rate for a category, if any.
pub fn default_cpc(category: &str) -> Option<f64> {
    DEFAULT_CPC
        .get(category.trim().to_ascii_lowercase().as_str())
        .copied()
}

/// Revenue at risk with optional per-category CPC overrides.
pub fn rar_cpc(missed: &MissedClicks, custom_cpc: Option<&BTreeMap<String, f64>>) -> f64 {
    match custom_cpc {
        Some(custom) => CpcTable::with_overrides(custom.clone()).revenue_at_risk(missed),
        None => CpcTable::default().revenue_at_risk(missed),
    }
}

fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}
