//! # Sentinel Core
//!
//! Shared building blocks for Metric Sentinel:
//! - Error type and `Result` alias used at every I/O boundary
//! - Service configuration (YAML file plus environment overrides)
//! - The line-log collaborator that receives per-sample operator lines

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod config;
pub mod error;
pub mod linelog;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, DetectorConfig, LoggingConfig, ServerConfig, SimulatorConfig};
    pub use crate::linelog::{FileLineLog, LineLog, MemoryLineLog, NoopLineLog};
    pub use crate::{Error, Result};
}
