//! Service configuration.
//!
//! Loaded from a YAML file (`config/sentinel.yaml` by default). Every section
//! has defaults, so a partial file only needs the keys it changes:
//!
//! ```yaml
//! detector:
//!   threshold_z_score: 3.0
//! server:
//!   port: 9090
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::{SocketAddr, ToSocketAddrs},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

/// Default z-score threshold
pub const DEFAULT_THRESHOLD_Z_SCORE: f64 = 2.5;

/// Default sliding window capacity
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Default number of observations before verdicts are issued
pub const DEFAULT_MIN_OBSERVATIONS: u64 = 5;

/// Default simulator tick
pub const DEFAULT_SIMULATOR_INTERVAL_MS: u64 = 2000;

/// Default line-log file
pub const DEFAULT_LOG_FILE: &str = "anomalyDetection.log";

/// Top-level sentinel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detector parameters
    pub detector: DetectorConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Internal metric simulator
    pub simulator: SimulatorConfig,
    /// Line-log settings
    pub logging: LoggingConfig,
}

/// Anomaly detector parameters, fixed for the lifetime of a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Absolute z-score above which a sample is anomalous
    pub threshold_z_score: f64,
    /// Number of most recent samples kept in the window
    pub window_size: usize,
    /// Samples required before any verdict is issued
    pub min_observations: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_z_score: DEFAULT_THRESHOLD_Z_SCORE,
            window_size: DEFAULT_WINDOW_SIZE,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

impl DetectorConfig {
    /// Check the parameters describe a usable detector
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_z_score.is_finite() || self.threshold_z_score <= 0.0 {
            return Err(Error::config(format!(
                "detector.threshold_z_score must be a positive finite number, got {}",
                self.threshold_z_score
            )));
        }
        if self.window_size == 0 {
            return Err(Error::config("detector.window_size must be at least 1"));
        }
        if self.min_observations == 0 {
            return Err(Error::config("detector.min_observations must be at least 1"));
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Maximum accepted request body
    pub max_body_bytes: usize,
    /// Allow cross-origin requests
    pub enable_cors: bool,
    /// Origins allowed when CORS is enabled; `*` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Resolve the bind address. `host` may be an IP literal or a host name;
    /// a name resolving to several addresses binds the first.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::config(format!("invalid server host {:?}: {e}", self.host)))?
            .next()
            .ok_or_else(|| Error::config(format!("server host {:?} has no addresses", self.host)))
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Internal metric simulator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Run the simulator alongside the API
    pub enabled: bool,
    /// Delay between generated samples
    pub interval_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: DEFAULT_SIMULATOR_INTERVAL_MS,
        }
    }
}

impl SimulatorConfig {
    /// Tick interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Line-log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// File receiving per-sample lines
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!(path = %path.display(), "Configuration file parsed");
        Ok(config)
    }

    /// Parse configuration from YAML text and validate it
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    ///
    /// - `PORT`: server port (container platforms inject this)
    /// - `SENTINEL_LOG_FILE`: line-log path
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::config(format!("invalid value for PORT: {port}")))?;
        }
        if let Some(file) = lookup("SENTINEL_LOG_FILE") {
            self.logging.file = PathBuf::from(file);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.server.request_timeout_secs == 0 {
            return Err(Error::config("server.request_timeout_secs must be at least 1"));
        }
        if self.server.enable_cors && self.server.cors_origins.is_empty() {
            return Err(Error::config(
                "server.cors_origins must list at least one origin when CORS is enabled",
            ));
        }
        if self.simulator.interval_ms == 0 {
            return Err(Error::config("simulator.interval_ms must be at least 1"));
        }
        Ok(())
    }
}
