pub mod extractor;
pub mod normalizer;

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{BACKUP_RESULTS, MAX_RESULTS};
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::types::{ResultSource, ScrapeFailure, ScrapeResult, Symbol};

/// Result of one live scrape attempt, before the backup policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Live(Vec<Symbol>),
    Failed(ScrapeFailure),
}

impl ScrapeOutcome {
    /// Turn the attempt into what callers see. A failed attempt becomes the
    /// fixed backup sequence, still reported as a success.
    pub fn into_result(self) -> (ScrapeResult, ResultSource) {
        match self {
            ScrapeOutcome::Live(results) => (
                ScrapeResult {
                    success: true,
                    message: format!("Found {} results", results.len()),
                    results,
                    timestamp: Some(Utc::now()),
                },
                ResultSource::Live,
            ),
            ScrapeOutcome::Failed(reason) => {
                warn!("Live scrape failed ({reason}); serving backup data");
                (
                    ScrapeResult {
                        success: true,
                        message: "Using backup data (failed to fetch live results)".to_string(),
                        results: BACKUP_RESULTS.to_vec(),
                        timestamp: Some(Utc::now()),
                    },
                    ResultSource::Backup,
                )
            }
        }
    }
}

/// Fetch → extract → normalize, capped at MAX_RESULTS.
pub struct Scraper<S> {
    source: S,
    deadline: Duration,
}

impl<S: PageSource> Scraper<S> {
    pub fn new(source: S, deadline: Duration) -> Self {
        Self { source, deadline }
    }

    /// One live attempt, bounded by the deadline end to end. Upstream trouble
    /// comes back as `ScrapeOutcome::Failed`; `Err` is reserved for failures
    /// of this process (e.g. a panicked parser).
    pub async fn scrape(&self) -> Result<ScrapeOutcome> {
        info!("Scraping latest results");

        match tokio::time::timeout(self.deadline, self.attempt()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Scrape exceeded {}s deadline", self.deadline.as_secs());
                Ok(ScrapeOutcome::Failed(ScrapeFailure::Transport(
                    "deadline exceeded".to_string(),
                )))
            }
        }
    }

    async fn attempt(&self) -> Result<ScrapeOutcome> {
        let body = match self.source.fetch_page().await {
            Ok(body) => body,
            Err(e) => return Ok(ScrapeOutcome::Failed(ScrapeFailure::Transport(e.to_string()))),
        };

        // html5ever trees are !Send and parsing is CPU-bound.
        let extracted = tokio::task::spawn_blocking(move || extractor::extract_symbols(&body)).await?;

        match extracted {
            Ok(mut symbols) => {
                symbols.truncate(MAX_RESULTS);
                info!("Scrape complete: {} results", symbols.len());
                Ok(ScrapeOutcome::Live(symbols))
            }
            Err(reason) => {
                warn!("Extraction failed: {reason}");
                Ok(ScrapeOutcome::Failed(reason))
            }
        }
    }
}
