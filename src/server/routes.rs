//! HTTP route handlers for the sourcing API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::search::{CorpusError, CorpusStats, SearchError, SearchRequest, SearchResponse};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/search", post(search))
        .route("/api/corpus", get(corpus_stats))
        .route("/api/corpus/reload", post(reload_corpus))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.corpus().snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "service": "sourcing-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "corpus": {
            "records": snapshot.len(),
            "version": snapshot.version(),
        },
        "web_enabled": state.engine.web_enabled(),
    }))
}

/// Map a search error to an HTTP status.
fn search_status(error: &SearchError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Handle supplier search requests.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    state.engine.search(&request).await.map(Json).map_err(|e| {
        let status = search_status(&e);
        if status.is_server_error() {
            tracing::error!(error = %e, "Search failed");
        }
        (status, e.to_string())
    })
}

/// Corpus statistics.
async fn corpus_stats(State(state): State<Arc<AppState>>) -> Json<CorpusStats> {
    Json(state.corpus().snapshot().stats())
}

/// Reload response.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Statistics of the newly published snapshot.
    pub corpus: CorpusStats,
    /// Version that was current before the reload.
    pub previous_version: u64,
}

/// Rescan the corpus from the configured loader.
async fn reload_corpus(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, (StatusCode, String)> {
    let previous_version = state.corpus().snapshot().version();
    let result = match state.loader.as_deref() {
        Some(loader) => state.corpus().reload(loader).await,
        None => Err(CorpusError::NotConfigured),
    };

    match result {
        Ok(snapshot) => Ok(Json(ReloadResponse {
            corpus: snapshot.stats(),
            previous_version,
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Corpus reload failed");
            Err((StatusCode::BAD_GATEWAY, format!("Corpus reload failed: {e}")))
        }
    }
}
