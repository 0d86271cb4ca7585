pub mod health;

use std::time::Instant;

use axum::{
    extract::Request,
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::cache::handlers as cache_handlers;
use crate::chat::handlers as chat_handlers;
use crate::rate_limit::handlers as rate_limit_handlers;
use crate::rate_limit::middleware::{enforce_rate_limit, request_client_ip};
use crate::roles::handlers as role_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/chat", post(chat_handlers::handle_chat))
        .route("/roles", get(role_handlers::handle_list_roles))
        .route("/roles/:role_id", get(role_handlers::handle_get_role))
        .route("/roles/:role_id/examples", get(role_handlers::handle_role_examples))
        .route("/cache/stats", get(cache_handlers::handle_cache_stats))
        .route("/cache/clear", post(cache_handlers::handle_cache_clear))
        .route("/rate-limit/stats", get(rate_limit_handlers::handle_rate_limit_stats))
        .layer(middleware::from_fn_with_state(state.clone(), enforce_rate_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// One line per request, including requests rejected by the rate limiter.
async fn log_request(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = request_client_ip(&request);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        ip = %ip,
        user_agent = %user_agent,
        "Request handled"
    );
    response
}
