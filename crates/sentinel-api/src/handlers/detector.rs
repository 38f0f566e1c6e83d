//! Detector introspection
//!
//! - GET /api/detector/config - detector parameters
//! - GET /api/detector/stats - counters and lifecycle phase

use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::metric::{encode_json, MetricState};

/// Detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfigResponse {
    pub threshold_z_score: f64,
    pub window_size: usize,
    pub min_observations: u64,
}

/// GET /api/detector/config
#[instrument(skip_all)]
pub async fn detector_config(State(state): State<Arc<MetricState>>) -> Response {
    let config = state.detector.config();
    encode_json(
        state.log.as_ref(),
        &DetectorConfigResponse {
            threshold_z_score: config.threshold_z_score,
            window_size: config.window_size,
            min_observations: config.min_observations,
        },
    )
}

/// GET /api/detector/stats
#[instrument(skip_all)]
pub async fn detector_stats(State(state): State<Arc<MetricState>>) -> Response {
    encode_json(state.log.as_ref(), &state.detector.stats())
}
