//! Shared health state for the /api/health endpoint.
//! Updated by the results cache, read by the API.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::latency::{Percentiles, ScrapeLatency};
use crate::types::ResultSource;

const SOURCE_LIVE: u8 = 1;
const SOURCE_BACKUP: u8 = 2;

#[derive(Default)]
pub struct HealthState {
    pub cache_hits: AtomicU64,
    pub live_scrapes: AtomicU64,
    pub backup_scrapes: AtomicU64,
    /// Millisecond timestamp of the last completed scrape (0 = none).
    pub last_scrape_at_ms: AtomicI64,
    /// 0 = none, then SOURCE_LIVE / SOURCE_BACKUP.
    last_source: AtomicU8,
    pub latency: ScrapeLatency,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub cache_hits: u64,
    pub live_scrapes: u64,
    pub backup_scrapes: u64,
    pub last_scrape_at: Option<DateTime<Utc>>,
    pub last_scrape_source: Option<ResultSource>,
    pub scrape_latency_ms: Percentiles,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scrape(&self, source: ResultSource, at: DateTime<Utc>) {
        let (counter, tag) = match source {
            ResultSource::Live => (&self.live_scrapes, SOURCE_LIVE),
            ResultSource::Backup => (&self.backup_scrapes, SOURCE_BACKUP),
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.last_source.store(tag, Ordering::Relaxed);
        self.last_scrape_at_ms.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_source(&self) -> Option<ResultSource> {
        match self.last_source.load(Ordering::Relaxed) {
            SOURCE_LIVE => Some(ResultSource::Live),
            SOURCE_BACKUP => Some(ResultSource::Backup),
            _ => None,
        }
    }

    pub fn report(&self) -> HealthReport {
        let last_ms = self.last_scrape_at_ms.load(Ordering::Relaxed);
        let last_source = self.last_source();
        HealthReport {
            status: match last_source {
                Some(ResultSource::Backup) => "degraded",
                _ => "ok",
            },
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            live_scrapes: self.live_scrapes.load(Ordering::Relaxed),
            backup_scrapes: self.backup_scrapes.load(Ordering::Relaxed),
            last_scrape_at: (last_ms != 0)
                .then(|| DateTime::from_timestamp_millis(last_ms))
                .flatten(),
            last_scrape_source: last_source,
            scrape_latency_ms: self.latency.percentiles(),
        }
    }
}
