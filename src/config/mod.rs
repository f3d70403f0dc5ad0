// src/config/mod.rs
//! Service configuration: engine weights, CPC overrides and alert cut points.
//!
//! Lookup order:
//! 1) `$SCORING_CONFIG_PATH` (must exist)
//! 2) `config/scoring.toml`
//! 3) `config/scoring.json`
//! 4) built-in defaults
//!
//! TOML shape:
//! ```toml
//! [engine_weights]
//! chatgpt = 0.40
//! gemini = 0.35
//! perplexity = 0.25
//!
//! [cpc]
//! buy = 16.0
//!
//! [alerts.seo]
//! scale = "percentage"
//! green = 85
//! yellow = 60
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::alert::{AlertThresholds, MetricKey, ThresholdPolicy};
use crate::engines::EngineWeights;
use crate::revenue::CpcTable;

pub const ENV_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/scoring.toml";
pub const DEFAULT_JSON_PATH: &str = "config/scoring.json";

/// Resolved, validated configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringConfig {
    /// Normalized to sum 1.0.
    pub engine_weights: EngineWeights,
    pub cpc: CpcTable,
    pub alerts: AlertThresholds,
}

/// On-disk shape; every section is optional.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    engine_weights: Option<EngineWeights>,
    #[serde(default)]
    cpc: BTreeMap<String, f64>,
    #[serde(default)]
    alerts: BTreeMap<String, ThresholdPolicy>,
}

impl ScoringConfig {
    /// Load from an explicit path. TOML or JSON by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let raw = parse_raw(&content, ext.as_str())
            .with_context(|| format!("parsing scoring config {}", path.display()))?;
        let cfg = Self::from_raw(raw)?;
        tracing::info!(path = %path.display(), "scoring config loaded");
        Ok(cfg)
    }

    /// Env var, then default paths, then built-in defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for p in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        tracing::debug!("no scoring config found, using built-in defaults");
        Ok(Self::default())
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let engine_weights = raw
            .engine_weights
            .map(|w| w.normalized())
            .unwrap_or_default();

        let mut alerts = AlertThresholds::default();
        for (key, policy) in raw.alerts {
            let metric: MetricKey = key
                .parse()
                .with_context(|| format!("alerts.{key}"))?;
            alerts
                .set(metric, policy)
                .with_context(|| format!("alerts.{key}"))?;
        }

        Ok(Self {
            engine_weights,
            cpc: CpcTable::with_overrides(raw.cpc),
            alerts,
        })
    }
}

fn parse_raw(s: &str, hint_ext: &str) -> Result<RawConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            if let Ok(v) = serde_json::from_str(s) {
                return Ok(v);
            }
            toml::from_str(s).map_err(|_| anyhow!("unsupported scoring config format"))
        }
    }
}
