//! Request logging middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Logs one line per request with method, path, status and timing.
///
/// The log level follows the response class so server errors stand out
/// in the stream without a separate alerting layer.
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // First hop of x-forwarded-for is the original client when a proxy
    // sits in front of us
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string());

    let start = Instant::now();
    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    match status {
        s if s.is_server_error() => tracing::error!(
            %method, %path, status = s.as_u16(), elapsed_ms, ?client_ip,
            "request failed"
        ),
        s if s.is_client_error() => tracing::warn!(
            %method, %path, status = s.as_u16(), elapsed_ms, ?client_ip,
            "request rejected"
        ),
        s => tracing::info!(
            %method, %path, status = s.as_u16(), elapsed_ms,
            "request served"
        ),
    }

    response
}
