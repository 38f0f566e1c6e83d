//! API route definitions.
//!
//! ## Metric Endpoints
//! - `POST /api/metric` - Submit a sample for scoring
//! - `GET /api/metrics` - Current window, mean and standard deviation
//!
//! ## Detector Endpoints
//! - `GET /api/detector/config` - Detector parameters
//! - `GET /api/detector/stats` - Detector counters and phase
//!
//! ## Infrastructure Endpoints
//! - `/health`, `/health/live` - Health checks

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::timeout::TimeoutLayer;

use crate::{
    handlers::{detector::*, health::*, metric::*},
    middleware::{cors_middleware, logging_middleware},
    ApiConfig,
};

/// Create the API router
pub fn create_router(
    config: &ApiConfig,
    metric_state: Arc<MetricState>,
    health_state: Arc<HealthState>,
) -> Router {
    let api = Router::new()
        .route("/metric", post(submit_metric))
        .route("/metrics", get(current_metrics))
        .route("/detector/config", get(detector_config))
        .route("/detector/stats", get(detector_stats))
        .with_state(metric_state);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/health/live", get(liveness))
        .with_state(health_state);

    let app = Router::new()
        .nest("/api", api)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(config.max_body_size));

    let app = if config.enable_logging {
        app.layer(middleware::from_fn(logging_middleware))
    } else {
        app
    };

    let app = if config.enable_cors {
        app.layer(cors_middleware(config.cors_origins.clone()))
    } else {
        app
    };

    app.layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
}
