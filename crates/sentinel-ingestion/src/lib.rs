//! # Sentinel Ingestion
//!
//! Producers that feed samples into the shared detector:
//! - [`source::MetricSource`] implementations (synthetic system load, fixed sequences)
//! - [`recorder::record_sample`], the single ingest path shared by the
//!   simulator and the HTTP API
//! - [`simulator::Simulator`], the periodic internal producer

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod recorder;
pub mod simulator;
pub mod source;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::recorder::{alert_line, record_sample, sample_line};
    pub use crate::simulator::{Simulator, SimulatorSummary};
    pub use crate::source::{MetricSource, SequenceSource, SystemMetricSimulator};
}
