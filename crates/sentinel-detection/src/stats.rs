//! Rolling-window statistics.

use std::collections::VecDeque;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (denominator = `len`), 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Fixed-capacity window of the most recent samples
///
/// Mean and standard deviation are recomputed from scratch after every
/// insertion, so they always describe exactly the samples in the window.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    data: VecDeque<f64>,
    capacity: usize,
    mean: f64,
    std_dev: f64,
}

impl RollingWindow {
    /// Create an empty window. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
            mean: 0.0,
            std_dev: 0.0,
        }
    }

    /// Append a sample, evicting the oldest one when over capacity
    pub fn insert(&mut self, value: f64) {
        self.data.push_back(value);
        if self.data.len() > self.capacity {
            self.data.pop_front();
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        if self.data.is_empty() {
            self.mean = 0.0;
            self.std_dev = 0.0;
            return;
        }

        let len = self.data.len() as f64;
        self.mean = self.data.iter().sum::<f64>() / len;
        let sum_sq: f64 = self
            .data
            .iter()
            .map(|v| {
                let diff = v - self.mean;
                diff * diff
            })
            .sum();
        self.std_dev = (sum_sq / len).sqrt();
    }

    /// Independent copy of the samples, oldest first
    pub fn snapshot(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
