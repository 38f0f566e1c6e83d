//! Sliding-window z-score anomaly detector.
//!
//! Every sample is appended to a [`RollingWindow`] and scored against the
//! window's post-insertion mean and population standard deviation:
//!
//! ```text
//! z = (value - mean) / std_dev
//! anomalous  <=>  |z| > threshold_z_score
//! ```
//!
//! Two cases never produce a verdict and report `(false, 0.0)` instead:
//! - fewer than `min_observations` samples have ever been ingested (warming)
//! - the window has zero variance, so `z` is NaN or infinite
//!
//! All detector state lives behind one mutex. Each operation holds the guard
//! for its whole critical section, so concurrent callers observe a single
//! total order of operations.

use crate::stats::RollingWindow;
use metric_sentinel_core::config::DetectorConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Verdict for a single ingested sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResult {
    /// Whether `|z_score|` exceeded the threshold
    pub is_anomaly: bool,
    /// Signed z-score, 0 when no verdict could be issued
    pub z_score: f64,
}

impl AnomalyResult {
    /// Non-anomalous result used for the warming and zero-variance cases
    pub const NONE: AnomalyResult = AnomalyResult {
        is_anomaly: false,
        z_score: 0.0,
    };
}

/// Consistent view of the window and its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub samples: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
}

/// Detector lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorPhase {
    /// Not enough observations yet; every verdict is non-anomalous
    Warming,
    /// Full z-score evaluation applies
    Active,
}

impl DetectorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorPhase::Warming => "warming",
            DetectorPhase::Active => "active",
        }
    }
}

impl std::fmt::Display for DetectorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detector counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorStats {
    /// Samples ever ingested
    pub observations: u64,
    /// Anomalous verdicts issued
    pub anomalies: u64,
    /// Samples currently in the window
    pub window_len: usize,
    /// Window capacity
    pub window_size: usize,
    pub phase: DetectorPhase,
}

#[derive(Debug)]
struct DetectorState {
    window: RollingWindow,
    observations: u64,
    anomalies: u64,
}

/// Thread-safe z-score anomaly detector
///
/// # Example
/// ```
/// use metric_sentinel_detection::{AnomalyDetector, DetectorConfig};
///
/// let detector = AnomalyDetector::new(DetectorConfig::default());
/// let result = detector.check_anomaly(63.0);
/// assert!(!result.is_anomaly); // still warming up
/// ```
#[derive(Debug)]
pub struct AnomalyDetector {
    config: DetectorConfig,
    state: Mutex<DetectorState>,
}

impl AnomalyDetector {
    /// Create a detector with an empty window
    pub fn new(config: DetectorConfig) -> Self {
        info!(
            threshold_z_score = config.threshold_z_score,
            window_size = config.window_size,
            min_observations = config.min_observations,
            "Creating z-score anomaly detector"
        );

        let window = RollingWindow::new(config.window_size);
        Self {
            config,
            state: Mutex::new(DetectorState {
                window,
                observations: 0,
                anomalies: 0,
            }),
        }
    }

    /// Ingest a sample and evaluate it against the updated window
    pub fn check_anomaly(&self, value: f64) -> AnomalyResult {
        let mut state = self.state.lock();

        state.window.insert(value);
        state.observations += 1;

        if state.observations < self.config.min_observations {
            return AnomalyResult::NONE;
        }

        let z_score = (value - state.window.mean()) / state.window.std_dev();
        if !z_score.is_finite() {
            return AnomalyResult::NONE;
        }

        let is_anomaly = z_score.abs() > self.config.threshold_z_score;
        if is_anomaly {
            state.anomalies += 1;
        }

        AnomalyResult {
            is_anomaly,
            z_score,
        }
    }

    /// Copy of the current window, oldest sample first
    pub fn get_metrics(&self) -> Vec<f64> {
        self.state.lock().window.snapshot()
    }

    /// Window samples with their mean and standard deviation, read together
    pub fn current_window(&self) -> WindowSnapshot {
        let state = self.state.lock();
        WindowSnapshot {
            samples: state.window.snapshot(),
            mean: state.window.mean(),
            std_dev: state.window.std_dev(),
        }
    }

    pub fn stats(&self) -> DetectorStats {
        let state = self.state.lock();
        DetectorStats {
            observations: state.observations,
            anomalies: state.anomalies,
            window_len: state.window.len(),
            window_size: state.window.capacity(),
            phase: self.phase_for(state.observations),
        }
    }

    pub fn phase(&self) -> DetectorPhase {
        let observations = self.state.lock().observations;
        self.phase_for(observations)
    }

    fn phase_for(&self, observations: u64) -> DetectorPhase {
        if observations < self.config.min_observations {
            DetectorPhase::Warming
        } else {
            DetectorPhase::Active
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc, thread};

    fn detector(threshold: f64, window_size: usize, min_observations: u64) -> AnomalyDetector {
        AnomalyDetector::new(DetectorConfig {
            threshold_z_score: threshold,
            window_size,
            min_observations,
        })
    }

    #[test]
    fn test_warming_suppresses_verdicts() {
        let detector = detector(2.5, 10, 5);

        for value in [50.0, 51.0, 1_000_000.0, -1_000_000.0] {
            let result = detector.check_anomaly(value);
            assert_eq!(result, AnomalyResult::NONE);
            assert_eq!(detector.phase(), DetectorPhase::Warming);
        }

        assert_eq!(detector.stats().observations, 4);
        assert_eq!(detector.stats().anomalies, 0);
    }

    #[test]
    fn test_phase_transition_is_permanent() {
        let detector = detector(2.5, 3, 5);

        for i in 0..4 {
            detector.check_anomaly(i as f64);
            assert_eq!(detector.phase(), DetectorPhase::Warming);
        }
        for i in 0..20 {
            detector.check_anomaly(i as f64);
            assert_eq!(detector.phase(), DetectorPhase::Active);
        }
    }

    #[test]
    fn test_first_verdict_at_min_observations() {
        let detector = detector(2.5, 10, 5);

        for value in [1.0, 2.0, 3.0, 4.0] {
            assert_eq!(detector.check_anomaly(value), AnomalyResult::NONE);
        }

        // Window [1..5]: mean 3, population std dev sqrt(2)
        let result = detector.check_anomaly(5.0);
        assert!((result.z_score - std::f64::consts::SQRT_2).abs() < 1e-9);
        assert!(!result.is_anomaly);
        assert_eq!(detector.phase(), DetectorPhase::Active);
    }

    #[test]
    fn test_zero_variance_guard() {
        let detector = detector(2.5, 5, 5);

        for _ in 0..10 {
            assert_eq!(detector.check_anomaly(10.0), AnomalyResult::NONE);
        }
        assert_eq!(detector.phase(), DetectorPhase::Active);
    }

    #[test]
    fn test_spike_after_uniform_window_is_not_anomalous() {
        let detector = detector(2.5, 5, 5);
        for _ in 0..5 {
            detector.check_anomaly(10.0);
        }

        // Window becomes [10, 10, 10, 10, 100]: mean 28, std dev 36, z = 2.0
        let result = detector.check_anomaly(100.0);
        assert!(!result.is_anomaly);
        assert!((result.z_score - 2.0).abs() < 1e-9);

        let snapshot = detector.current_window();
        assert_eq!(snapshot.samples, vec![10.0, 10.0, 10.0, 10.0, 100.0]);
        assert!((snapshot.mean - 28.0).abs() < 1e-9);
        assert!((snapshot.std_dev - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_anomaly_detected_in_wide_window() {
        let detector = detector(2.5, 10, 5);
        for _ in 0..9 {
            detector.check_anomaly(50.0);
        }

        // Window [50 x9, 500]: mean 95, std dev 135, z = 3.0
        let result = detector.check_anomaly(500.0);
        assert!(result.is_anomaly);
        assert!((result.z_score - 3.0).abs() < 1e-9);
        assert_eq!(detector.stats().anomalies, 1);
    }

    #[test]
    fn test_negative_deviation() {
        let detector = detector(2.5, 10, 5);
        for _ in 0..9 {
            detector.check_anomaly(500.0);
        }

        let result = detector.check_anomaly(50.0);
        assert!(result.is_anomaly);
        assert!((result.z_score + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Same spike as above scores exactly 3.0, which does not exceed 3.0
        let detector = detector(3.0, 10, 5);
        for _ in 0..9 {
            detector.check_anomaly(50.0);
        }

        let result = detector.check_anomaly(500.0);
        assert!(!result.is_anomaly);
        assert!((result.z_score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_observations_survive_eviction() {
        let detector = detector(2.5, 3, 5);
        for i in 0..25 {
            detector.check_anomaly(i as f64);
        }

        let stats = detector.stats();
        assert_eq!(stats.observations, 25);
        assert_eq!(stats.window_len, 3);
        assert_eq!(stats.window_size, 3);
        assert_eq!(detector.get_metrics(), vec![22.0, 23.0, 24.0]);
    }

    #[test]
    fn test_get_metrics_copy_isolation() {
        let detector = detector(2.5, 5, 5);
        detector.check_anomaly(1.0);
        detector.check_anomaly(2.0);

        let mut metrics = detector.get_metrics();
        metrics.clear();
        metrics.push(1e9);

        assert_eq!(detector.get_metrics(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let detector = detector(2.5, 5, 5);
        for v in [3.0, 1.0, 4.0, 1.0, 5.0, 9.0] {
            detector.check_anomaly(v);
        }

        assert_eq!(detector.get_metrics(), detector.get_metrics());
        assert_eq!(detector.current_window(), detector.current_window());
        assert_eq!(detector.stats(), detector.stats());
    }

    #[test]
    fn test_concurrent_ingest_is_serializable() {
        let detector = Arc::new(detector(2.5, 10, 5));
        let threads = 8;
        let per_thread = 500;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let detector = Arc::clone(&detector);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let value = (t * per_thread + i) as f64;
                        let result = detector.check_anomaly(value);
                        assert!(result.z_score.is_finite());
                        let _ = detector.get_metrics();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = detector.stats();
        assert_eq!(stats.observations, (threads * per_thread) as u64);

        // The window must hold ten distinct values, each one actually submitted
        let snapshot = detector.current_window();
        assert_eq!(snapshot.samples.len(), 10);
        let unique: HashSet<u64> = snapshot.samples.iter().map(|v| *v as u64).collect();
        assert_eq!(unique.len(), 10);
        assert!(snapshot
            .samples
            .iter()
            .all(|v| *v >= 0.0 && *v < (threads * per_thread) as f64));

        // Statistics agree with the samples they were read alongside
        let expected_mean = crate::stats::mean(&snapshot.samples);
        let expected_std = crate::stats::std_dev(&snapshot.samples);
        assert!((snapshot.mean - expected_mean).abs() < 1e-6);
        assert!((snapshot.std_dev - expected_std).abs() < 1e-6);
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        let detector = Arc::new(detector(2.5, 4, 1));
        let writer = {
            let detector = Arc::clone(&detector);
            thread::spawn(move || {
                for i in 0..2_000 {
                    detector.check_anomaly((i % 17) as f64);
                }
            })
        };

        for _ in 0..2_000 {
            let snapshot = detector.current_window();
            let expected_mean = crate::stats::mean(&snapshot.samples);
            assert!((snapshot.mean - expected_mean).abs() < 1e-9);
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let json = serde_json::to_value(AnomalyResult {
            is_anomaly: true,
            z_score: 3.0,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"isAnomaly": true, "zScore": 3.0}));

        let stats = detector(2.5, 10, 5).stats();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["phase"], "warming");
        assert_eq!(json["windowSize"], 10);
    }
}
