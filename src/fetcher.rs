use std::future::Future;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::config::{Config, SOURCE_REFERER, USER_AGENTS};
use crate::error::{AppError, Result};

/// Anything that can hand back the raw results page.
pub trait PageSource: Send + Sync {
    fn fetch_page(&self) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Enforces a minimum gap between consecutive requests from one fetcher.
///
/// The lock is held through the wait, so concurrent callers queue up and
/// each gets its own slot. The wait is an async sleep: dropping the caller's
/// future (e.g. on a deadline) cancels it.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Sleep until the interval since the previous request has elapsed,
    /// then claim the current instant as the new "previous request".
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limit: waiting {:.2}s before next request", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// RateLimitedFetcher
// ---------------------------------------------------------------------------

pub struct RateLimitedFetcher {
    client: reqwest::Client,
    url: String,
    limiter: RateLimiter,
}

impl RateLimitedFetcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: cfg.source_url.clone(),
            limiter: RateLimiter::new(cfg.min_request_interval),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PageSource for RateLimitedFetcher {
    async fn fetch_page(&self) -> Result<String> {
        self.limiter.acquire().await;

        let resp = match self.client.get(&self.url).headers(browser_headers()).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("Request to {} failed: {e}", self.url);
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!("Request to {} returned status {}", self.url, status.as_u16());
            return Err(AppError::Status(status.as_u16()));
        }

        resp.text().await.map_err(|e| {
            error!("Reading body from {} failed: {e}", self.url);
            AppError::from(e)
        })
    }
}

/// Browser-like headers with a user agent picked at random per request.
fn browser_headers() -> HeaderMap {
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(header::REFERER, HeaderValue::from_static(SOURCE_REFERER));
    headers
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;

    use super::*;
    use crate::config::CACHE_TTL_SECS;

    /// Local stand-in for the results site: 503 on the first hit, then a page.
    #[derive(Clone, Default)]
    struct Upstream {
        hits: Arc<AtomicUsize>,
        user_agents: Arc<std::sync::Mutex<Vec<String>>>,
    }

    async fn flaky_page(State(up): State<Upstream>, headers: HeaderMap) -> (StatusCode, &'static str) {
        if let Some(ua) = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()) {
            up.user_agents.lock().unwrap().push(ua.to_string());
        }
        if up.hits.fetch_add(1, Ordering::SeqCst) == 0 {
            (StatusCode::SERVICE_UNAVAILABLE, "busy")
        } else {
            (StatusCode::OK, "<table><tr><td>ok</td></tr></table>")
        }
    }

    async fn serve(up: Upstream) -> SocketAddr {
        let app = axum::Router::new()
            .route("/", axum::routing::get(flaky_page))
            .with_state(up);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    fn config_for(url: String) -> Config {
        Config {
            source_url: url,
            log_level: "info".to_string(),
            api_port: 0,
            frontend_dir: "frontend".to_string(),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            min_request_interval: Duration::from_millis(10),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn non_success_status_then_body() {
        let up = Upstream::default();
        let addr = serve(up.clone()).await;
        let fetcher = RateLimitedFetcher::new(&config_for(format!("http://{addr}/"))).unwrap();

        let first = fetcher.fetch_page().await;
        assert!(matches!(first, Err(AppError::Status(503))), "got {first:?}");

        let body = fetcher.fetch_page().await.unwrap();
        assert!(body.contains("<table>"));
        assert_eq!(up.hits.load(Ordering::SeqCst), 2);

        let seen = up.user_agents.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|ua| USER_AGENTS.contains(&ua.as_str())), "{seen:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = RateLimitedFetcher::new(&config_for(format!("http://{addr}/"))).unwrap();
        let outcome = fetcher.fetch_page().await;
        assert!(matches!(outcome, Err(AppError::Http(_))), "got {outcome:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn first_request_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_requests_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2), "elapsed={:?}", start.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_remaining_gap_is_waited() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let before = Instant::now();
        limiter.acquire().await;
        let waited = before.elapsed();
        assert!(waited >= Duration::from_millis(500), "waited={waited:?}");
        assert!(waited < Duration::from_secs(1), "waited={waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_cancelled_by_deadline() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.acquire().await;
        let outcome = tokio::time::timeout(Duration::from_secs(1), limiter.acquire()).await;
        assert!(outcome.is_err());
    }

    #[test]
    fn headers_carry_a_known_user_agent() {
        let headers = browser_headers();
        let ua = headers.get(header::USER_AGENT).unwrap().to_str().unwrap();
        assert!(USER_AGENTS.contains(&ua));
        assert_eq!(headers.get(header::REFERER).unwrap(), SOURCE_REFERER);
    }
}
