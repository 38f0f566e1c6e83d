//! Metric sources.

use chrono::{Timelike, Utc};

/// Anything that can produce the next sample for the detector
pub trait MetricSource: Send {
    /// Source name for logging and metrics labels
    fn name(&self) -> &'static str;

    /// Produce the next sample
    fn next_value(&mut self) -> f64;
}

/// Synthetic CPU-like load derived from the wall clock
///
/// Yields `50 + (second-of-minute mod 40)`, i.e. values in `[50, 89]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMetricSimulator;

impl SystemMetricSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Sample value for a given second of the minute
    pub fn value_at(second: u32) -> f64 {
        50.0 + f64::from(second % 40)
    }
}

impl MetricSource for SystemMetricSimulator {
    fn name(&self) -> &'static str {
        "simulator"
    }

    fn next_value(&mut self) -> f64 {
        Self::value_at(Utc::now().second())
    }
}

/// Cycles through a fixed list of values
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    position: usize,
}

impl SequenceSource {
    /// Returns `None` for an empty list
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            values,
            position: 0,
        })
    }
}

impl MetricSource for SequenceSource {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn next_value(&mut self) -> f64 {
        let value = self.values[self.position];
        self.position = (self.position + 1) % self.values.len();
        value
    }
}
