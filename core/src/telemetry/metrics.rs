use serde::Serialize;
use std::sync::Mutex;

/// Counters for the fetch cycles a scheduler has run.
pub struct MetricsRecorder {
    inner: Mutex<FetchMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchMetrics {
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_ticks: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FetchMetrics::default()),
        }
    }

    pub fn record_started(&self) {
        self.update(|metrics| metrics.started += 1);
    }

    pub fn record_success(&self) {
        self.update(|metrics| metrics.succeeded += 1);
    }

    pub fn record_error(&self) {
        self.update(|metrics| metrics.failed += 1);
    }

    pub fn record_skipped(&self) {
        self.update(|metrics| metrics.skipped_ticks += 1);
    }

    pub fn snapshot(&self) -> FetchMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            FetchMetrics::default()
        }
    }

    fn update(&self, apply: impl FnOnce(&mut FetchMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
