//! # Sentinel Detection
//!
//! Streaming anomaly detection for Metric Sentinel.
//!
//! - [`stats::RollingWindow`]: fixed-capacity FIFO window with population
//!   mean and standard deviation
//! - [`detectors::zscore::AnomalyDetector`]: thread-safe z-score detector
//!   with a cold-start gate and a zero-variance guard

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod detectors;
pub mod stats;

pub use detectors::zscore::{
    AnomalyDetector, AnomalyResult, DetectorPhase, DetectorStats, WindowSnapshot,
};
pub use metric_sentinel_core::config::DetectorConfig;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::detectors::zscore::{
        AnomalyDetector, AnomalyResult, DetectorPhase, DetectorStats, WindowSnapshot,
    };
    pub use crate::stats::RollingWindow;
    pub use metric_sentinel_core::config::DetectorConfig;
}
