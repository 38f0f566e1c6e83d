//! Metric submission and window introspection
//!
//! - POST /api/metric - score a submitted sample
//! - GET /api/metrics - current window with its mean and standard deviation

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metric_sentinel_core::linelog::LineLog;
use metric_sentinel_detection::AnomalyDetector;
use metric_sentinel_ingestion::recorder::record_sample;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

/// Source label for samples submitted over HTTP
pub const API_SOURCE: &str = "api";

pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";
pub const ENCODE_FAILURE_MESSAGE: &str = "Failed to encode response";

// =============================================================================
// STATE
// =============================================================================

/// Shared state for metric handlers
#[derive(Debug, Clone)]
pub struct MetricState {
    pub detector: Arc<AnomalyDetector>,
    pub log: Arc<dyn LineLog>,
}

impl MetricState {
    pub fn new(detector: Arc<AnomalyDetector>, log: Arc<dyn LineLog>) -> Self {
        Self { detector, log }
    }
}

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Sample submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRequest {
    pub value: f64,
}

/// Verdict for a submitted sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResponse {
    /// Echo of the submitted value
    pub metric: f64,
    pub is_anomaly: bool,
    pub z_score: f64,
}

/// Current detector window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub metrics: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /api/metric
#[instrument(skip_all)]
pub async fn submit_metric(
    State(state): State<Arc<MetricState>>,
    payload: Result<Json<MetricRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected metric submission");
            state.log.record(&format!("API Error: {INVALID_BODY_MESSAGE}"));
            metrics::counter!("sentinel_api_rejections_total").increment(1);
            return (StatusCode::BAD_REQUEST, INVALID_BODY_MESSAGE).into_response();
        }
    };

    let result = record_sample(
        &state.detector,
        state.log.as_ref(),
        API_SOURCE,
        request.value,
    );

    if !result.z_score.is_finite() {
        return encode_failure(state.log.as_ref(), "non-finite z-score");
    }

    encode_json(
        state.log.as_ref(),
        &AnomalyResponse {
            metric: request.value,
            is_anomaly: result.is_anomaly,
            z_score: result.z_score,
        },
    )
}

/// GET /api/metrics
#[instrument(skip_all)]
pub async fn current_metrics(State(state): State<Arc<MetricState>>) -> Response {
    let snapshot = state.detector.current_window();

    // serde_json writes NaN and infinities as null; refuse them instead
    if !snapshot.mean.is_finite() || !snapshot.std_dev.is_finite() {
        return encode_failure(state.log.as_ref(), "non-finite window statistics");
    }

    encode_json(
        state.log.as_ref(),
        &MetricsResponse {
            metrics: snapshot.samples,
            mean: snapshot.mean,
            std_dev: snapshot.std_dev,
        },
    )
}

/// Serialize a body as JSON, answering 500 if encoding fails
pub(crate) fn encode_json<T: Serialize>(log: &dyn LineLog, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) => encode_failure(log, &e.to_string()),
    }
}

fn encode_failure(log: &dyn LineLog, reason: &str) -> Response {
    error!(reason, "Failed to encode response");
    metrics::counter!("sentinel_api_encode_failures_total").increment(1);
    log.record(&format!("API Error: {ENCODE_FAILURE_MESSAGE}"));
    (StatusCode::INTERNAL_SERVER_ERROR, ENCODE_FAILURE_MESSAGE).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use metric_sentinel_core::linelog::MemoryLineLog;
    use serde::ser::Error as _;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("unencodable"))
        }
    }

    #[tokio::test]
    async fn test_encode_json_success() {
        let log = MemoryLineLog::new();
        let response = encode_json(
            &log,
            &AnomalyResponse {
                metric: 63.0,
                is_anomaly: false,
                z_score: 0.5,
            },
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"metric": 63.0, "isAnomaly": false, "zScore": 0.5})
        );
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_encode_json_failure() {
        let log = MemoryLineLog::new();
        let response = encode_json(&log, &Unencodable);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], ENCODE_FAILURE_MESSAGE.as_bytes());
        assert_eq!(log.lines(), vec!["API Error: Failed to encode response".to_string()]);
    }
}
