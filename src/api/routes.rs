use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::analyze;
use crate::api::health::{HealthReport, HealthState};
use crate::cache::ResultCache;
use crate::error::AppError;
use crate::fetcher::PageSource;
use crate::types::{AnalysisResult, ScrapeResult, Symbol};

pub struct ApiState<S> {
    pub results: Arc<ResultCache<S>>,
    pub health: Arc<HealthState>,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            results: Arc::clone(&self.results),
            health: Arc::clone(&self.health),
        }
    }
}

/// JSON API only.
pub fn api_router<S>(state: ApiState<S>) -> Router
where
    S: PageSource + 'static,
{
    Router::new()
        .route("/api/results", get(get_results::<S>))
        .route("/api/analyze", post(post_analyze))
        .route("/api/health", get(get_health::<S>))
        .with_state(state)
}

/// API plus the static front-end; unknown paths get `index.html`.
pub fn router<S>(state: ApiState<S>, frontend_dir: &Path) -> Router
where
    S: PageSource + 'static,
{
    let index = ServeFile::new(frontend_dir.join("index.html"));
    let static_files = ServeDir::new(frontend_dir).fallback(index);

    api_router(state)
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_results<S: PageSource>(
    State(state): State<ApiState<S>>,
) -> Result<Json<ScrapeResult>, AppError> {
    Ok(Json(state.results.get_results().await?))
}

async fn post_analyze(body: Bytes) -> Result<Json<AnalysisResult>, AppError> {
    let history = parse_history(&body)?;
    let unknown = history.iter().filter(|s| s.is_none()).count();
    info!("Analyzing {} results ({} unrecognised)", history.len(), unknown);
    Ok(Json(analyze(&history)))
}

async fn get_health<S: PageSource>(State(state): State<ApiState<S>>) -> Json<HealthReport> {
    Json(state.health.report())
}

/// Body must be a JSON array, e.g. `["1","CT","H"]`. Elements that are not one
/// of the 8 codes are kept as `None`.
fn parse_history(body: &[u8]) -> Result<Vec<Option<Symbol>>, AppError> {
    let invalid = || AppError::InvalidInput("Invalid data. Send a list of results.".to_string());

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(invalid());
    }
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| invalid())?;
    let items = value.as_array().ok_or_else(invalid)?;

    Ok(items
        .iter()
        .map(|item| item.as_str().and_then(Symbol::from_code))
        .collect())
}
