use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use super::rate_limit::client_key;

pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let ip = client_key(req.headers(), peer);

    let response = next.run(req).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        ip = %ip,
        "request"
    );

    response
}

/// Upper bound on a 5xx body buffered for logging.
const MAX_LOGGED_ERROR_BODY: usize = 64 * 1024;

/// Logs the body of every 5xx response, then hands the response on unchanged.
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    match to_bytes(body, MAX_LOGGED_ERROR_BODY).await {
        Ok(bytes) => {
            error!(
                %method,
                path = %path,
                status = parts.status.as_u16(),
                body = %String::from_utf8_lossy(&bytes),
                "server error"
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            error!(
                %method,
                path = %path,
                status = parts.status.as_u16(),
                "server error, body unreadable: {}",
                e
            );
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::empty())
        }
    }
}
