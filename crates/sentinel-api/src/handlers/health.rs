//! Health checks
//!
//! - GET /health - status, version and uptime
//! - GET /health/live - liveness probe

use std::{sync::Arc, time::Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Shared state for health handlers
#[derive(Debug)]
pub struct HealthState {
    version: String,
    started_at: Instant,
}

impl HealthState {
    pub fn new(version: String) -> Self {
        Self {
            version,
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: state.version.clone(),
            uptime_secs: state.started_at.elapsed().as_secs(),
        }),
    )
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
