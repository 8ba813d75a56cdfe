//! In-memory histogram of end-to-end scrape durations.
//! Recorded by the results cache on every miss, read by /api/health.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Values stored in milliseconds.
pub struct ScrapeLatency {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    pub p50: Option<u64>,
    pub p95: Option<u64>,
    pub p99: Option<u64>,
}

impl ScrapeLatency {
    /// Tracks 1ms to 10min, 3 significant figures.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 600_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let ms = d.as_millis().clamp(1, 600_000) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(ms);
        }
    }

    pub fn percentiles(&self) -> Percentiles {
        let empty = Percentiles { p50: None, p95: None, p99: None };
        let Ok(h) = self.inner.lock() else {
            return empty;
        };
        if h.len() == 0 {
            return empty;
        }
        Percentiles {
            p50: Some(h.value_at_quantile(0.5)),
            p95: Some(h.value_at_quantile(0.95)),
            p99: Some(h.value_at_quantile(0.99)),
        }
    }
}

impl Default for ScrapeLatency {
    fn default() -> Self {
        Self::new()
    }
}
