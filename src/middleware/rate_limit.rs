//! In-memory fixed-window rate limiting keyed by client address.
//!
//! Each [`RateLimiter`] owns its own visitor map, so the general, login and
//! public-form limiters never share counts. A request is admitted while the
//! key has made fewer than `max_requests` admitted requests with no gap longer
//! than `window`; the first request after such a gap starts a fresh count.
//! Bursts straddling a reset can briefly admit up to twice the limit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::error_response;

// tokio::time::interval 不接受零周期
const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Visitor {
    count: u32,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    name: &'static str,
    max_requests: u32,
    window: Duration,
    visitors: Mutex<HashMap<String, Visitor>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                max_requests,
                window,
                visitors: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Returns whether a request from `key` is admitted, recording it if so.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut visitors = self.visitors();

        let Some(visitor) = visitors.get_mut(key) else {
            visitors.insert(
                key.to_string(),
                Visitor {
                    count: 1,
                    last_seen: now,
                },
            );
            return true;
        };

        if now.duration_since(visitor.last_seen) > self.inner.window {
            visitor.count = 1;
            visitor.last_seen = now;
            return true;
        }

        if visitor.count >= self.inner.max_requests {
            return false;
        }

        visitor.count += 1;
        visitor.last_seen = now;
        true
    }

    /// Drops every key idle for longer than one window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let window = self.inner.window;
        let mut visitors = self.visitors();

        let before = visitors.len();
        visitors.retain(|_, v| now.duration_since(v.last_seen) <= window);
        before - visitors.len()
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.visitors().len()
    }

    /// Runs [`sweep`](Self::sweep) once per window (at least once a second)
    /// until `shutdown` is cancelled.
    pub fn spawn_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        let period = limiter.window().max(MIN_SWEEP_PERIOD);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // 第一次 tick 立即返回，跳过
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(limiter = limiter.name(), removed, "Swept idle rate limit entries");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        tracing::debug!(limiter = limiter.name(), "Rate limit sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }

    fn visitors(&self) -> MutexGuard<'_, HashMap<String, Visitor>> {
        // 临界区内没有会 panic 的操作，中毒后数据仍然一致
        self.inner
            .visitors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The limiter instances wired into the router.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: RateLimiter,
    pub login: RateLimiter,
    pub public_form: RateLimiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Self {
        let window = config.rate_limit_window();
        Self {
            general: RateLimiter::new("general", config.rate_limit_requests, window),
            login: RateLimiter::new("login", config.login_rate_limit, window),
            public_form: RateLimiter::new("public_form", config.form_rate_limit, window),
        }
    }

    pub fn spawn_sweepers(&self, shutdown: &CancellationToken) -> Vec<JoinHandle<()>> {
        [&self.general, &self.login, &self.public_form]
            .into_iter()
            .map(|limiter| limiter.spawn_sweeper(shutdown.clone()))
            .collect()
    }
}

/// Picks the client key: `X-Real-IP`, then the first `X-Forwarded-For` entry,
/// then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header_str(headers, "x-real-ip")
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
                .map(String::from)
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let key = client_key(req.headers(), peer);

    if limiter.allow(&key) {
        return next.run(req).await;
    }

    tracing::warn!(limiter = limiter.name(), client = %key, "Rate limit exceeded");

    let retry_after = limiter.window().as_secs().max(1);
    let mut response = error_response(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded");
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
