use axum::{extract::State, Json};

use crate::rate_limit::RateLimiterStats;
use crate::state::AppState;

/// GET /rate-limit/stats
pub async fn handle_rate_limit_stats(State(state): State<AppState>) -> Json<RateLimiterStats> {
    Json(state.rate_limiter.get_stats())
}
