use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::cache::{offload, CacheStats, ResponseCache};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CacheClearResponse {
    pub message: String,
    pub removed: usize,
}

/// GET /cache/stats
pub async fn handle_cache_stats(State(state): State<AppState>) -> Result<Json<CacheStats>, AppError> {
    let stats = offload(&state.cache, ResponseCache::stats)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in cache stats: {e}")))?;
    Ok(Json(stats))
}

/// POST /cache/clear
pub async fn handle_cache_clear(
    State(state): State<AppState>,
) -> Result<Json<CacheClearResponse>, AppError> {
    let removed = offload(&state.cache, ResponseCache::clear_all)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in cache clear: {e}")))?;
    info!(removed, "Cache cleared via API");
    Ok(Json(CacheClearResponse {
        message: format!("Cache cleared. {removed} entries removed."),
        removed,
    }))
}
