//! Line-log collaborator.
//!
//! The detector pipeline reports every ingested sample (and every alert) as a
//! plain text line. Components receive a `LineLog` handle at construction
//! instead of writing to process-wide logging state.

use crate::Result;
use chrono::Local;
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Prefix written before every file line
pub const LINE_PREFIX: &str = "INFO: ";

/// Sink for operator-facing log lines
pub trait LineLog: Send + Sync + std::fmt::Debug {
    /// Record a single line
    fn record(&self, line: &str);
}

/// Append-only file log
///
/// Lines look like `INFO: 2024/05/01 12:00:00 Metric: 63.00, ...`.
#[derive(Debug)]
pub struct FileLineLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLineLog {
    /// Open (or create) the log file in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineLog for FileLineLog {
    fn record(&self, line: &str) {
        let entry = format!(
            "{}{} {}\n",
            LINE_PREFIX,
            Local::now().format("%Y/%m/%d %H:%M:%S"),
            line
        );

        let mut file = self.file.lock();
        if let Err(e) = file.write_all(entry.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "Failed to write line log");
        }
    }
}

/// In-memory log, used by tests and offline replay
#[derive(Debug, Default)]
pub struct MemoryLineLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLineLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded line, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl LineLog for MemoryLineLog {
    fn record(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Discards every line
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLineLog;

impl LineLog for NoopLineLog {
    fn record(&self, _line: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_file_log_appends_prefixed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomalyDetection.log");

        let log = FileLineLog::open(&path).unwrap();
        log.record("Starting API server on 0.0.0.0:8080");
        log.record("Metric: 63.00, Z-Score: 0.00, Anomaly: false");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with(LINE_PREFIX)));
        assert!(lines[0].ends_with("Starting API server on 0.0.0.0:8080"));
        assert!(lines[1].ends_with("Metric: 63.00, Z-Score: 0.00, Anomaly: false"));
    }

    #[test]
    fn test_file_log_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.log");

        FileLineLog::open(&path).unwrap().record("first");
        FileLineLog::open(&path).unwrap().record("second");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_file_log_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sentinel.log");
        assert!(FileLineLog::open(path).is_err());
    }

    #[test]
    fn test_memory_log_concurrent_writers() {
        let log = Arc::new(MemoryLineLog::new());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        log.record(&format!("thread {t} line {i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 100);
    }

    #[test]
    fn test_noop_log() {
        let log: Box<dyn LineLog> = Box::new(NoopLineLog);
        log.record("dropped");
    }
}
