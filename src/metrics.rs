use axum::{routing::get, Router};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::engines::{Engine, EngineWeights};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the active engine weights
    /// as static gauges.
    pub fn init(weights: &EngineWeights) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        for engine in Engine::ALL {
            gauge!("engine_weight", "engine" => engine.as_str()).set(weights.weight_for(engine));
        }

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Count one request to a scoring endpoint. No-op without a recorder.
pub fn record_request(endpoint: &'static str) {
    counter!("scoring_requests_total", "endpoint" => endpoint).increment(1);
}

/// Publish the latest recalibrated confidence.
pub fn record_confidence(score: f64) {
    gauge!("forecast_confidence_score").set(score);
}
