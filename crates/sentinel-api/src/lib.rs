//! # Sentinel API
//!
//! HTTP surface for Metric Sentinel:
//! - `POST /api/metric` - submit a sample, get its verdict
//! - `GET /api/metrics` - current window with mean and standard deviation
//! - `GET /api/detector/config`, `GET /api/detector/stats` - introspection
//! - `GET /health`, `GET /health/live` - health checks

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use metric_sentinel_core::{config::ServerConfig, linelog::LineLog, Error, Result};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::handlers::{health::HealthState, metric::MetricState};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed origins (`*` allows any)
    pub cors_origins: Vec<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Log every request
    pub enable_logging: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            timeout_secs: 30,
            max_body_size: 64 * 1024,
            enable_logging: true,
        }
    }
}

impl ApiConfig {
    /// Build from the `server` section of the service configuration
    pub fn from_server_config(server: &ServerConfig) -> Result<Self> {
        Ok(Self {
            bind_addr: server.bind_addr()?,
            enable_cors: server.enable_cors,
            cors_origins: server.cors_origins.clone(),
            timeout_secs: server.request_timeout_secs,
            max_body_size: server.max_body_bytes,
            ..Default::default()
        })
    }
}

/// API server
#[derive(Debug)]
pub struct ApiServer {
    config: ApiConfig,
    metric_state: Arc<MetricState>,
    health_state: Arc<HealthState>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, metric_state: Arc<MetricState>, version: String) -> Self {
        Self {
            config,
            metric_state,
            health_state: Arc::new(HealthState::new(version)),
        }
    }

    /// Router with all routes and middleware applied
    pub fn router(&self) -> Router {
        routes::create_router(
            &self.config,
            Arc::clone(&self.metric_state),
            Arc::clone(&self.health_state),
        )
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = match TcpListener::bind(self.config.bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.metric_state
                    .log
                    .record(&format!("API Server Error: {e}"));
                return Err(Error::Server(format!(
                    "failed to bind {}: {e}",
                    self.config.bind_addr
                )));
            }
        };
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let log: Arc<dyn LineLog> = Arc::clone(&self.metric_state.log);
        log.record(&format!("Starting API server on {addr}"));
        info!(%addr, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                log.record(&format!("API Server Error: {e}"));
                Error::Server(e.to_string())
            })?;

        info!("API server shut down gracefully");
        Ok(())
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handlers::{health::HealthState, metric::MetricState};
    pub use crate::routes::create_router;
    pub use crate::{ApiConfig, ApiServer};
}
