use std::time::Duration;

use crate::error::{AppError, Result};
use crate::types::Symbol;

pub const SOURCE_URL: &str = "https://crazy-time.cc/statistics/";
pub const SOURCE_REFERER: &str = "https://crazy-time.cc/";

/// Minimum gap between two requests issued by the same fetcher (seconds).
pub const MIN_REQUEST_INTERVAL_SECS: u64 = 2;

/// Per-request HTTP timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// How long a stored scrape result is served before the next fetch (seconds).
pub const CACHE_TTL_SECS: u64 = 60;

/// Slack added on top of the rate-limit wait and the request timeout to get
/// the deadline of one whole scrape attempt, parsing included (seconds).
pub const SCRAPE_DEADLINE_MARGIN_SECS: u64 = 3;

/// Cap on the number of spins kept from one scrape.
pub const MAX_RESULTS: usize = 100;

/// Rotated on every request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Served whenever the live scrape fails. Most recent first.
pub const BACKUP_RESULTS: [Symbol; 20] = {
    use crate::types::Symbol::*;
    [
        One, Two, One, Five, CoinFlip, One, Two, Ten, One, Pachinko,
        Two, One, Five, One, CashHunt, Two, One, CrazyTime, One, Two,
    ]
};

#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Directory holding the static front-end (FRONTEND_DIR)
    pub frontend_dir: String,
    /// Freshness window of the results cache (CACHE_TTL_SECS)
    pub cache_ttl: Duration,
    /// Minimum gap between outbound requests (MIN_REQUEST_INTERVAL_SECS)
    pub min_request_interval: Duration,
    /// Outbound HTTP timeout (REQUEST_TIMEOUT_SECS)
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            source_url: std::env::var("SOURCE_URL").unwrap_or_else(|_| SOURCE_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            frontend_dir: std::env::var("FRONTEND_DIR").unwrap_or_else(|_| "frontend".to_string()),
            cache_ttl: Duration::from_secs(env_secs("CACHE_TTL_SECS", CACHE_TTL_SECS)),
            min_request_interval: Duration::from_secs(env_secs(
                "MIN_REQUEST_INTERVAL_SECS",
                MIN_REQUEST_INTERVAL_SECS,
            )),
            request_timeout: Duration::from_secs(env_secs(
                "REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )),
        })
    }
}

impl Config {
    /// Worst-case rate-limit wait plus the HTTP timeout plus a margin, so a
    /// slow but healthy upstream is never cut off by the outer deadline.
    pub fn scrape_deadline(&self) -> Duration {
        self.min_request_interval
            + self.request_timeout
            + Duration::from_secs(SCRAPE_DEADLINE_MARGIN_SECS)
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(interval_secs: u64, timeout_secs: u64) -> Config {
        Config {
            source_url: SOURCE_URL.to_string(),
            log_level: "info".to_string(),
            api_port: 5000,
            frontend_dir: "frontend".to_string(),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            min_request_interval: Duration::from_secs(interval_secs),
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[test]
    fn default_deadline_is_twenty_seconds() {
        let cfg = config(MIN_REQUEST_INTERVAL_SECS, REQUEST_TIMEOUT_SECS);
        assert_eq!(cfg.scrape_deadline(), Duration::from_secs(20));
    }

    #[test]
    fn deadline_follows_overridden_interval_and_timeout() {
        let cfg = config(10, 45);
        assert_eq!(cfg.scrape_deadline(), Duration::from_secs(58));
        assert!(cfg.scrape_deadline() > cfg.min_request_interval + cfg.request_timeout);
    }
}
