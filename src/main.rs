//! Trust Score Service: binary entrypoint.
//! Boots the Axum HTTP server over the scoring core, wiring config, shared
//! state, metrics and middleware.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trust_score_engine::api::{create_router, AppState};
use trust_score_engine::config::ScoringConfig;
use trust_score_engine::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - SCORING_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("SCORING_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trust_score_engine=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let config = ScoringConfig::load_default()?;
    let metrics = Metrics::init(&config.engine_weights)?;

    let state = AppState::from_config(config);
    let router = create_router(state).merge(metrics.router());

    tracing::info!("trust score service ready");
    Ok(router.into())
}
