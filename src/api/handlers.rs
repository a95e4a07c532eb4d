//! API Handlers
//!
//! HTTP request handlers exposing the tiered cache.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::TieredCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TieredCache>,
    /// TTL applied when a write doesn't name one
    pub default_ttl: Duration,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<TieredCache>, default_ttl: Duration) -> Self {
        Self { cache, default_ttl }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(cache: Arc<TieredCache>, config: &Config) -> Self {
        Self::new(cache, config.default_ttl())
    }
}

/// Handler for PUT /cache/:namespace/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map_or(state.default_ttl, Duration::from_secs);
    let outcome = state
        .cache
        .set(&namespace, &key, req.value.into_bytes(), ttl)
        .await?;

    Ok(Json(SetResponse::new(key, outcome.is_degraded())))
}

/// Handler for GET /cache/:namespace/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&namespace, &key).await? {
        Some(value) => Ok(Json(GetResponse::new(namespace, key, &value))),
        None => Err(CacheError::NotFound(format!("{namespace}:{key}"))),
    }
}

/// Handler for DELETE /cache/:namespace/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state.cache.delete(&namespace, &key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /cache/:namespace/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state
        .cache
        .invalidate_pattern(&namespace, &req.pattern)
        .await?;

    Ok(Json(InvalidateResponse {
        namespace,
        pattern: req.pattern,
        removed,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Always answers 200; `status` is "degraded" while the remote tier is down.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from(state.cache.health().await))
}
