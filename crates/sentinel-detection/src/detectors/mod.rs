//! Anomaly detection implementations.

pub mod zscore;
