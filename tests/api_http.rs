// tests/api_http.rs
//
// HTTP-level tests for the scoring Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use trust_score_engine::api::{create_router, AppState};
use trust_score_engine::config::ScoringConfig;

const BODY_LIMIT: usize = 1024 * 1024;

/// Same router as the binary, with built-in defaults (no config file lookup).
fn test_router() -> Router {
    create_router(AppState::from_config(ScoringConfig::default()))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

fn post(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn health_returns_ok() {
    let resp = test_router().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "ok");
}

#[tokio::test]
async fn composite_scores_and_classifies() {
    let payload = json!({
        "pillar": "seo",
        "metrics": { "mentions": 100, "citations": 100, "sentiment": 100, "shareOfVoice": 100 }
    });
    let (status, v) = send(test_router(), post("/score/composite", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["pillar"], "seo");
    assert!((v["score"].as_f64().unwrap() - 100.0).abs() < 1e-9);
    assert_eq!(v["level"], "green");
}

#[tokio::test]
async fn unknown_pillar_is_400() {
    let payload = json!({
        "pillar": "sem",
        "metrics": { "mentions": 1, "citations": 1, "sentiment": 1, "shareOfVoice": 1 }
    });
    let (status, v) = send(test_router(), post("/score/composite", payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().contains("sem"));
}

#[tokio::test]
async fn eeat_uses_count_regime() {
    let payload = json!({ "exp": true, "expx": true, "auth": true, "trust": false });
    let (status, v) = send(test_router(), post("/score/eeat", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["score"].as_f64().unwrap(), 75.0);
    assert_eq!(v["signals"], 3);
    assert_eq!(v["level"], "yellow");
}

#[tokio::test]
async fn overall_lists_contributions() {
    let payload = json!({ "seo": 80, "aeo": 70, "geo": 60, "ai": 90, "wh": 85, "mystery": 50 });
    let (status, v) = send(test_router(), post("/score/overall", payload)).await;
    assert_eq!(status, StatusCode::OK);
    let parts = v["contributions"].as_array().unwrap();
    assert_eq!(parts.len(), 6);
    let sum: f64 = parts
        .iter()
        .map(|p| p["contribution"].as_f64().unwrap())
        .sum();
    assert!((sum - v["score"].as_f64().unwrap()).abs() < 1e-9);
}

#[tokio::test]
async fn alert_query_and_unknown_metric() {
    let (status, v) = send(test_router(), get("/alert?metric=seo&value=75")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["level"], "yellow");

    let (status, _) = send(test_router(), get("/alert?metric=eeat&value=4")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(test_router(), get("/alert?metric=bogus&value=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn thresholds_table_exposes_both_regimes() {
    let (status, v) = send(test_router(), get("/alert/thresholds")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["eeat"]["scale"], "count");
    assert_eq!(v["seo"]["scale"], "percentage");
}

#[tokio::test]
async fn rar_with_custom_cpc() {
    let payload = json!({ "missed_clicks": { "buy": 10 }, "custom_cpc": { "buy": 20 } });
    let (status, v) = send(test_router(), post("/rar", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert!((v["revenue_at_risk"].as_f64().unwrap() - 200.0).abs() < 1e-9);
}

#[tokio::test]
async fn consensus_over_http() {
    let payload = json!([
        { "id": "x", "engine": "perplexity" },
        { "id": "x", "engine": "chatgpt" },
        { "id": "x", "engine": "gemini" },
        { "id": "y", "engine": "chatgpt" }
    ]);
    let (status, v) = send(test_router(), post("/consensus", payload)).await;
    assert_eq!(status, StatusCode::OK);
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["id"], "x");
    assert_eq!(arr[0]["unanimous"], true);
    assert_eq!(arr[1]["weak"], true);
}

#[tokio::test]
async fn feedback_loop_empty_is_identity() {
    let payload = json!({ "records": [], "previous_confidence_score": 0.89 });
    let (status, v) = send(test_router(), post("/feedback-loop", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["new_confidence_score"].as_f64().unwrap(), 0.89);
    assert_eq!(v["error_category"], "minor");
    assert_eq!(v["confidence_tier"], "high");
    let m = v["roi_forecast_confidence_multiplier"].as_f64().unwrap();
    assert!((m - (0.95 + 0.12 * 0.89)).abs() < 1e-9);
}

#[tokio::test]
async fn recalibrate_uses_completed_forecasts_from_log() {
    let app = test_router();

    // Nothing completed yet: confidence is carried forward.
    let (status, v) = send(
        app.clone(),
        post("/forecasts/recalibrate", json!({ "previous_confidence_score": 0.8 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["records_evaluated"], 0);
    assert_eq!(v["new_confidence_score"].as_f64().unwrap(), 0.8);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (_, v) = send(
            app.clone(),
            post(
                "/forecasts",
                json!({ "predicted_roi": 100.0, "role": "gm", "date": "2025-01-01" }),
            ),
        )
        .await;
        ids.push(v["id"].as_u64().unwrap());
    }
    let (status, _) = send(
        app.clone(),
        post(
            &format!("/forecasts/{}/outcome", ids[0]),
            json!({ "actual_roi": 70.0, "today": "2025-02-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, v) = send(
        app,
        post("/forecasts/recalibrate", json!({ "previous_confidence_score": 0.8 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["records_evaluated"], 1);
    assert_eq!(v["error_category"], "major");
    assert!(v["new_confidence_score"].as_f64().unwrap() < 0.8);
    assert_eq!(v["confidence_tier"], "low");
}

#[tokio::test]
async fn forecast_lifecycle() {
    let app = test_router();

    let (status, v) = send(
        app.clone(),
        post(
            "/forecasts",
            json!({ "predicted_roi": 100.0, "role": "gm", "date": "2025-01-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = v["id"].as_u64().unwrap();
    assert_eq!(v["due_date"], "2025-01-31");

    let (status, _) = send(
        app.clone(),
        post(
            &format!("/forecasts/{id}/outcome"),
            json!({ "actual_roi": 97.0, "today": "2025-01-10" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = send(app.clone(), get("/forecasts/due?today=2025-02-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v.as_array().unwrap().len(), 1);

    let (status, v) = send(
        app.clone(),
        post(
            &format!("/forecasts/{id}/outcome"),
            json!({ "actual_roi": 97.0, "today": "2025-02-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["actual_roi"].as_f64().unwrap(), 97.0);

    let (status, _) = send(
        app,
        post(
            "/forecasts/999/outcome",
            json!({ "actual_roi": 1.0, "today": "2025-02-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
