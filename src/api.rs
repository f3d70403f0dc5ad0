//! HTTP surface over the scoring core.
//!
//! Handlers are thin: deserialize, call the pure function with the
//! configured weight tables, serialize. JSON field names mirror the core
//! types verbatim.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::alert::{AlertLevel, MetricKey, ThresholdPolicy};
use crate::config::ScoringConfig;
use crate::consensus::{consensus_with, ConsensusResult, IssueHit};
use crate::error::ScoreError;
use crate::feedback::{
    calculate_feedback_loop, FeedbackLoopResult, ForecastRecord, PerformanceInputs,
};
use crate::history::{ForecastLog, LoggedForecast};
use crate::metrics::{record_confidence, record_request};
use crate::revenue::MissedClicks;
use crate::score::{
    explain_overall, score_ai_visibility_with, score_composite, score_eeat, score_mystery,
    score_website_health, EeatFlags, EngineCoverage, IndexationInput, MetaInput, MetricBlock,
    MysteryMetrics, OverallBreakdown, OverallParts, Pillar, VitalsInput,
};

const FORECAST_LOG_CAPACITY: usize = 10_000;

#[derive(Clone)]
pub struct AppState {
    config: Arc<ScoringConfig>,
    forecasts: Arc<ForecastLog>,
}

impl AppState {
    pub fn from_config(config: ScoringConfig) -> Self {
        Self {
            config: Arc::new(config),
            forecasts: Arc::new(ForecastLog::with_capacity(FORECAST_LOG_CAPACITY)),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/score/composite", post(composite))
        .route("/score/ai-visibility", post(ai_visibility))
        .route("/score/website-health", post(website_health))
        .route("/score/eeat", post(eeat))
        .route("/score/mystery", post(mystery))
        .route("/score/overall", post(overall))
        .route("/alert", get(alert))
        .route("/alert/thresholds", get(alert_thresholds))
        .route("/rar", post(revenue_at_risk))
        .route("/consensus", post(consensus))
        .route("/feedback-loop", post(feedback_loop))
        .route("/forecasts", post(issue_forecast))
        .route("/forecasts/due", get(due_forecasts))
        .route("/forecasts/recalibrate", post(recalibrate_from_log))
        .route("/forecasts/{id}/outcome", post(record_outcome))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router with config resolved from the environment (tests and binary).
pub fn router() -> anyhow::Result<Router> {
    let config = ScoringConfig::load_default()?;
    Ok(create_router(AppState::from_config(config)))
}

// ---- errors ----

pub struct ApiError(ScoreError);

impl From<ScoreError> for ApiError {
    fn from(e: ScoreError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        };
        tracing::warn!(error = %self.0, status = status.as_u16(), "request rejected");
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ---- scores ----

#[derive(Serialize)]
struct ScoreOut {
    score: f64,
    level: AlertLevel,
}

#[derive(Deserialize)]
struct CompositeReq {
    pillar: String,
    metrics: MetricBlock,
}

#[derive(Serialize)]
struct CompositeOut {
    pillar: Pillar,
    score: f64,
    level: AlertLevel,
}

async fn composite(
    State(state): State<AppState>,
    Json(body): Json<CompositeReq>,
) -> Result<Json<CompositeOut>, ApiError> {
    record_request("composite");
    let pillar: Pillar = body.pillar.parse()?;
    let score = score_composite(&body.metrics, pillar);
    Ok(Json(CompositeOut {
        pillar,
        score,
        level: state.config().alerts.classify(pillar.into(), score),
    }))
}

async fn ai_visibility(
    State(state): State<AppState>,
    Json(coverage): Json<EngineCoverage>,
) -> Json<ScoreOut> {
    record_request("ai_visibility");
    let score = score_ai_visibility_with(&coverage, &state.config().engine_weights);
    Json(ScoreOut {
        score,
        level: state.config().alerts.classify(MetricKey::Ai, score),
    })
}

#[derive(Deserialize)]
struct HealthReq {
    vitals: VitalsInput,
    meta: MetaInput,
    indexation: IndexationInput,
}

async fn website_health(
    State(state): State<AppState>,
    Json(body): Json<HealthReq>,
) -> Json<ScoreOut> {
    record_request("website_health");
    let score = score_website_health(&body.vitals, &body.meta, &body.indexation);
    Json(ScoreOut {
        score,
        level: state.config().alerts.classify(MetricKey::Wh, score),
    })
}

#[derive(Serialize)]
struct EeatOut {
    score: f64,
    signals: u32,
    level: AlertLevel,
}

async fn eeat(State(state): State<AppState>, Json(flags): Json<EeatFlags>) -> Json<EeatOut> {
    record_request("eeat");
    let signals = flags.count();
    Json(EeatOut {
        score: score_eeat(&flags),
        signals,
        // Count regime: the classifier sees "n of 4", not the percentage.
        level: state.config().alerts.classify(MetricKey::Eeat, signals as f64),
    })
}

async fn mystery(
    State(state): State<AppState>,
    Json(metrics): Json<MysteryMetrics>,
) -> Json<ScoreOut> {
    record_request("mystery");
    let score = score_mystery(&metrics);
    Json(ScoreOut {
        score,
        level: state.config().alerts.classify(MetricKey::Mystery, score),
    })
}

#[derive(Serialize)]
struct OverallOut {
    #[serde(flatten)]
    breakdown: OverallBreakdown,
    level: AlertLevel,
}

async fn overall(
    State(state): State<AppState>,
    Json(parts): Json<OverallParts>,
) -> Json<OverallOut> {
    record_request("overall");
    let breakdown = explain_overall(&parts);
    let level = state.config().alerts.classify(MetricKey::Overall, breakdown.score);
    Json(OverallOut { breakdown, level })
}

// ---- alerts ----

#[derive(Deserialize)]
struct AlertQuery {
    metric: String,
    value: f64,
}

#[derive(Serialize)]
struct AlertOut {
    metric: MetricKey,
    value: f64,
    level: AlertLevel,
}

async fn alert(
    State(state): State<AppState>,
    Query(q): Query<AlertQuery>,
) -> Result<Json<AlertOut>, ApiError> {
    record_request("alert");
    let metric: MetricKey = q.metric.parse()?;
    Ok(Json(AlertOut {
        metric,
        value: q.value,
        level: state.config().alerts.classify(metric, q.value),
    }))
}

async fn alert_thresholds(
    State(state): State<AppState>,
) -> Json<BTreeMap<&'static str, ThresholdPolicy>> {
    let out = state
        .config()
        .alerts
        .iter()
        .map(|(k, p)| (k.as_str(), p))
        .collect();
    Json(out)
}

// ---- revenue ----

#[derive(Deserialize)]
struct RarReq {
    missed_clicks: MissedClicks,
    #[serde(default)]
    custom_cpc: Option<BTreeMap<String, f64>>,
}

#[derive(Serialize)]
struct RarOut {
    revenue_at_risk: f64,
}

async fn revenue_at_risk(
    State(state): State<AppState>,
    Json(body): Json<RarReq>,
) -> Json<RarOut> {
    record_request("rar");
    let table = match &body.custom_cpc {
        Some(custom) => state.config().cpc.merged(custom),
        None => state.config().cpc.clone(),
    };
    Json(RarOut {
        revenue_at_risk: table.revenue_at_risk(&body.missed_clicks),
    })
}

// ---- consensus ----

async fn consensus(
    State(state): State<AppState>,
    Json(hits): Json<Vec<IssueHit>>,
) -> Json<Vec<ConsensusResult>> {
    record_request("consensus");
    let out = consensus_with(&hits, &state.config().engine_weights);
    let unanimous = out.iter().filter(|c| c.tier() == "unanimous").count();
    let majority = out.iter().filter(|c| c.tier() == "majority").count();
    tracing::info!(
        hits = hits.len(),
        issues = out.len(),
        unanimous,
        majority,
        weak = out.len() - unanimous - majority,
        "consensus computed"
    );
    Json(out)
}

// ---- feedback loop ----

#[derive(Deserialize)]
struct FeedbackReq {
    #[serde(default)]
    records: Vec<ForecastRecord>,
    #[serde(default)]
    performance: PerformanceInputs,
    previous_confidence_score: f64,
}

async fn feedback_loop(Json(body): Json<FeedbackReq>) -> Json<FeedbackLoopResult> {
    record_request("feedback_loop");
    Json(recalibrate(
        &body.records,
        &body.performance,
        body.previous_confidence_score,
    ))
}

#[derive(Deserialize)]
struct RecalibrateReq {
    #[serde(default)]
    performance: PerformanceInputs,
    previous_confidence_score: f64,
}

/// Scheduled-job entry: recalibrate over every completed forecast in the log.
async fn recalibrate_from_log(
    State(state): State<AppState>,
    Json(body): Json<RecalibrateReq>,
) -> Json<FeedbackLoopResult> {
    record_request("forecast_recalibrate");
    let completed = state.forecasts.completed();
    Json(recalibrate(
        &completed,
        &body.performance,
        body.previous_confidence_score,
    ))
}

fn recalibrate(
    records: &[ForecastRecord],
    perf: &PerformanceInputs,
    previous: f64,
) -> FeedbackLoopResult {
    let res = calculate_feedback_loop(records, perf, previous);
    record_confidence(res.new_confidence_score);
    tracing::info!(
        records = res.records_evaluated,
        category = ?res.error_category,
        tier = ?res.confidence_tier,
        previous = res.previous_confidence_score,
        new = res.new_confidence_score,
        "confidence recalibrated"
    );
    res
}

// ---- forecast log ----

#[derive(Serialize)]
struct IssuedOut {
    id: u64,
    due_date: NaiveDate,
}

async fn issue_forecast(
    State(state): State<AppState>,
    Json(record): Json<ForecastRecord>,
) -> (StatusCode, Json<IssuedOut>) {
    record_request("forecast_issue");
    let due_date = record.due_date();
    let id = state.forecasts.issue(record);
    (StatusCode::CREATED, Json(IssuedOut { id, due_date }))
}

#[derive(Deserialize)]
struct OutcomeReq {
    actual_roi: f64,
    #[serde(default)]
    today: Option<NaiveDate>,
}

async fn record_outcome(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<OutcomeReq>,
) -> Result<Json<ForecastRecord>, ApiError> {
    record_request("forecast_outcome");
    let today = body.today.unwrap_or_else(today_utc);
    let rec = state.forecasts.record_outcome(id, body.actual_roi, today)?;
    Ok(Json(rec))
}

#[derive(Deserialize)]
struct DueQuery {
    #[serde(default)]
    today: Option<NaiveDate>,
}

async fn due_forecasts(
    State(state): State<AppState>,
    Query(q): Query<DueQuery>,
) -> Json<Vec<LoggedForecast>> {
    record_request("forecast_due");
    Json(state.forecasts.due(q.today.unwrap_or_else(today_utc)))
}

fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
