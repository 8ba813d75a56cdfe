mod analysis;
mod api;
mod cache;
mod config;
mod error;
mod fetcher;
mod scrape;
mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::RateLimitedFetcher;
use crate::scrape::Scraper;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let fetcher = RateLimitedFetcher::new(&cfg)?;
    info!(
        "Source: {} (min interval {}s, timeout {}s, deadline {}s, cache ttl {}s)",
        fetcher.url(),
        cfg.min_request_interval.as_secs(),
        cfg.request_timeout.as_secs(),
        cfg.scrape_deadline().as_secs(),
        cfg.cache_ttl.as_secs(),
    );

    let health = Arc::new(HealthState::new());
    let scraper = Scraper::new(fetcher, cfg.scrape_deadline());
    let results = Arc::new(ResultCache::new(scraper, cfg.cache_ttl, Arc::clone(&health)));

    let frontend_dir = Path::new(&cfg.frontend_dir);
    if !frontend_dir.join("index.html").exists() {
        info!("No index.html under {}; static front-end will 404", frontend_dir.display());
    } else {
        info!("Serving front-end from {}", frontend_dir.display());
    }

    let app = router(ApiState { results, health }, frontend_dir);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
