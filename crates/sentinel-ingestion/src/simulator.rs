//! Periodic internal producer.
//!
//! Pulls one value from its [`MetricSource`] per tick and pushes it through
//! [`record_sample`]. The first sample is taken immediately; later samples
//! follow the configured interval.

use crate::{recorder::record_sample, source::MetricSource};
use metric_sentinel_core::linelog::LineLog;
use metric_sentinel_detection::AnomalyDetector;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{info, instrument};

/// Outcome of a simulator run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorSummary {
    /// Samples produced
    pub samples: u64,
    /// Samples judged anomalous
    pub anomalies: u64,
}

/// Periodic sampler feeding the shared detector
pub struct Simulator<S> {
    source: S,
    detector: Arc<AnomalyDetector>,
    log: Arc<dyn LineLog>,
    interval: Duration,
    max_samples: Option<u64>,
}

impl<S> std::fmt::Debug for Simulator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("interval", &self.interval)
            .field("max_samples", &self.max_samples)
            .finish()
    }
}

impl<S: MetricSource> Simulator<S> {
    pub fn new(
        source: S,
        detector: Arc<AnomalyDetector>,
        log: Arc<dyn LineLog>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            log,
            interval,
            max_samples: None,
        }
    }

    /// Stop on its own after `max_samples` samples
    pub fn with_max_samples(mut self, max_samples: u64) -> Self {
        self.max_samples = Some(max_samples);
        self
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped)
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SimulatorSummary {
        info!(
            source = self.source.name(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting metric simulator"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut summary = SimulatorSummary::default();

        loop {
            if *shutdown.borrow() {
                break;
            }
            if self.max_samples.is_some_and(|max| summary.samples >= max) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let value = self.source.next_value();
                    let result = record_sample(&self.detector, self.log.as_ref(), self.source.name(), value);
                    summary.samples += 1;
                    if result.is_anomaly {
                        summary.anomalies += 1;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(
            samples = summary.samples,
            anomalies = summary.anomalies,
            "Metric simulator stopped"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SequenceSource;
    use metric_sentinel_core::{config::DetectorConfig, linelog::MemoryLineLog};
    use tokio::time::Instant;

    fn setup() -> (Arc<AnomalyDetector>, Arc<MemoryLineLog>) {
        (
            Arc::new(AnomalyDetector::new(DetectorConfig::default())),
            Arc::new(MemoryLineLog::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_sample_limit() {
        let (detector, log) = setup();
        let mut values = vec![50.0; 9];
        values.push(500.0);
        let source = SequenceSource::new(values).unwrap();

        let (_tx, rx) = watch::channel(false);
        let start = Instant::now();
        let summary = Simulator::new(source, detector.clone(), log.clone(), Duration::from_secs(2))
            .with_max_samples(10)
            .run(rx)
            .await;

        assert_eq!(summary, SimulatorSummary { samples: 10, anomalies: 1 });
        assert_eq!(detector.stats().observations, 10);
        // 10 samples, first one immediate: nine full intervals elapsed
        assert_eq!(start.elapsed(), Duration::from_secs(18));
        // one line per sample plus one alert line
        assert_eq!(log.len(), 11);
        assert!(log.lines()[10].starts_with("ALERT: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_shutdown_signal() {
        let (detector, log) = setup();
        let source = SequenceSource::new(vec![60.0, 61.0]).unwrap();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(
            Simulator::new(source, detector.clone(), log, Duration::from_secs(2)).run(rx),
        );

        // Samples at t = 0, 2, 4; shutdown at t = 5
        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(true).unwrap();

        let summary = handle.await.unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(detector.stats().observations, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_sender_dropped() {
        let (detector, log) = setup();
        let source = SequenceSource::new(vec![60.0]).unwrap();
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let summary = Simulator::new(source, detector, log, Duration::from_secs(2))
            .run(rx)
            .await;
        assert!(summary.samples <= 1);
    }

    #[tokio::test]
    async fn test_already_shut_down() {
        let (detector, log) = setup();
        let source = SequenceSource::new(vec![60.0]).unwrap();
        let (_tx, rx) = watch::channel(true);

        let summary = Simulator::new(source, detector, log.clone(), Duration::from_millis(10))
            .run(rx)
            .await;
        assert_eq!(summary.samples, 0);
        assert!(log.is_empty());
    }
}
