//! Shared ingest path.
//!
//! Both producers (the simulator loop and the HTTP handler) go through
//! [`record_sample`] so every sample is scored, counted and logged the same way.

use metric_sentinel_core::linelog::LineLog;
use metric_sentinel_detection::{AnomalyDetector, AnomalyResult};
use tracing::{debug, warn};

/// Line recorded for every ingested sample
pub fn sample_line(value: f64, result: &AnomalyResult) -> String {
    format!(
        "Metric: {:.2}, Z-Score: {:.2}, Anomaly: {}",
        value, result.z_score, result.is_anomaly
    )
}

/// Extra line recorded for anomalous samples
pub fn alert_line(value: f64, result: &AnomalyResult) -> String {
    format!(
        "ALERT: Anomaly detected with metric {:.2} (Z-Score: {:.2})",
        value, result.z_score
    )
}

/// Score a sample and report it on the line log
///
/// The detector lock is released before anything is written.
pub fn record_sample(
    detector: &AnomalyDetector,
    log: &dyn LineLog,
    source: &'static str,
    value: f64,
) -> AnomalyResult {
    let result = detector.check_anomaly(value);

    log.record(&sample_line(value, &result));
    metrics::counter!("sentinel_samples_ingested_total", "source" => source).increment(1);

    if result.is_anomaly {
        log.record(&alert_line(value, &result));
        metrics::counter!("sentinel_anomalies_detected_total", "source" => source).increment(1);
        warn!(
            source,
            value,
            z_score = result.z_score,
            "Anomaly detected"
        );
    } else {
        debug!(source, value, z_score = result.z_score, "Sample ingested");
    }

    result
}
