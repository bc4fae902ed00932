use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// Log method, path, status and latency of every request.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status();
    if status.is_server_error() {
        tracing::error!(
            %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            "request failed"
        );
    } else {
        tracing::info!(%method, path = %path, status = status.as_u16(), latency_ms, "request");
    }
    response
}
