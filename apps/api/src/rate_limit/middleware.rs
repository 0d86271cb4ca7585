//! Axum middleware that runs every request through the [`IpRateLimiter`].

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::rate_limit::EndpointClass;
use crate::state::AppState;

/// Resolves the rate-limiting identity: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real_ip) = header_str("x-real-ip") {
        return real_ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn request_client_ip(request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(request.headers(), peer)
}

pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.rate_limit_enabled {
        return next.run(request).await;
    }

    let ip = request_client_ip(&request);
    let path = request.uri().path().to_string();

    let (allowed, info) = state.rate_limiter.check_rate_limit(&ip, &path);
    if allowed {
        return next.run(request).await;
    }

    let retry_after = state
        .rate_limiter
        .get_remaining_time(&ip, &path)
        .map(|d| d.as_secs_f64().ceil() as u64)
        .unwrap_or(0);

    warn!(
        ip = %ip,
        endpoint = %path,
        endpoint_class = EndpointClass::from_path(&path).as_str(),
        current_requests = info.current_requests,
        max_requests = info.max_requests,
        retry_after,
        "Rate limit exceeded"
    );

    let body = Json(json!({
        "error": "Rate limit exceeded",
        "message": format!("Too many requests. Try again in {retry_after} seconds."),
        "rate_limit_info": info,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
