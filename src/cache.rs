use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::health::HealthState;
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::scrape::Scraper;
use crate::types::ScrapeResult;

struct CacheEntry {
    result: ScrapeResult,
    stored_at: Instant,
}

/// Last served scrape result plus the scraper that refreshes it.
///
/// The entry lock is held across a refresh, so concurrent misses queue
/// behind a single fetch and then read its result.
pub struct ResultCache<S> {
    scraper: Scraper<S>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
    health: Arc<HealthState>,
}

impl<S: PageSource> ResultCache<S> {
    pub fn new(scraper: Scraper<S>, ttl: Duration, health: Arc<HealthState>) -> Self {
        Self {
            scraper,
            ttl,
            entry: Mutex::new(None),
            health,
        }
    }

    /// Cached result if younger than the TTL, otherwise a fresh scrape (or
    /// the backup sequence when the scrape fails). Either is stored.
    pub async fn get_results(&self) -> Result<ScrapeResult> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            let age = cached.stored_at.elapsed();
            if age < self.ttl {
                debug!("Serving cached results ({:.1}s old)", age.as_secs_f64());
                self.health.record_cache_hit();
                return Ok(cached.result.clone());
            }
        }

        info!("Cache miss; fetching fresh results");
        let started = Instant::now();
        let (result, source) = self.scraper.scrape().await?.into_result();
        self.health.latency.record(started.elapsed());
        if let Some(ts) = result.timestamp {
            self.health.record_scrape(source, ts);
        }

        *entry = Some(CacheEntry {
            result: result.clone(),
            stored_at: Instant::now(),
        });
        Ok(result)
    }
}
