//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use sqlx::postgres::PgPoolOptions;
use subcult_api::{
    AppState,
    config::Config,
    middleware::{RateLimiter, RateLimiters},
    patreon::{CampaignData, CampaignInfo, CampaignSource, PatreonClient, PatreonError, TierInfo},
    router,
    utils::generate_token,
};
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://subcult@127.0.0.1:9/subcult_test".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiration_secs: 3600,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_origins: vec!["http://localhost:5175".to_string()],
        rate_limit_window_secs: 60,
        rate_limit_requests: 100,
        login_rate_limit: 5,
        form_rate_limit: 10,
        patreon_access_token: String::new(),
        patreon_campaign_id: String::new(),
        patreon_cache_ttl_secs: 60,
        patreon_api_url: "http://127.0.0.1:9".to_string(),
        admin_username: "admin".to_string(),
        admin_email: "admin@example.com".to_string(),
        admin_password: None,
    }
}

/// Upstream stand-in that counts fetches and can be switched into failure.
pub struct MockSource {
    configured: bool,
    delay: Duration,
    calls: AtomicUsize,
    fail: AtomicBool,
    patron_count: AtomicI64,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            configured: true,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            patron_count: AtomicI64::new(10),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        let source = Self::new();
        source.set_failing(true);
        source
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_patron_count(&self, count: i64) {
        self.patron_count.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl CampaignSource for MockSource {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_campaign(&self) -> Result<CampaignData, PatreonError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(PatreonError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }

        Ok(CampaignData {
            campaign: Some(CampaignInfo {
                patron_count: self.patron_count.load(Ordering::SeqCst),
                creation_name: "signal".to_string(),
                url: "https://www.patreon.com/subcult".to_string(),
            }),
            tiers: vec![TierInfo {
                title: "supporter".to_string(),
                amount_cents: 500,
                patron_count: 3,
                description: String::new(),
            }],
            cached_at: None,
        })
    }
}

pub fn limiters(general: u32, login: u32, public_form: u32) -> RateLimiters {
    let window = Duration::from_secs(60);
    RateLimiters {
        general: RateLimiter::new("general", general, window),
        login: RateLimiter::new("login", login, window),
        public_form: RateLimiter::new("public_form", public_form, window),
    }
}

pub fn test_state(source: Arc<dyn CampaignSource>) -> AppState {
    let config = test_config();
    // 惰性连接池，指向不可达地址；走到数据库的请求会很快以 500 结束
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(&config.database_url)
        .expect("lazy pool should build from a valid url");

    AppState {
        pool,
        config,
        patreon: PatreonClient::new(source, Duration::from_secs(60)),
    }
}

pub fn admin_token() -> String {
    let (token, _) = generate_token(
        "00000000-0000-0000-0000-000000000001",
        "admin",
        "admin",
        &test_config(),
    )
    .expect("token should sign");
    format!("Bearer {token}")
}

pub fn test_app(source: Arc<dyn CampaignSource>, limiters: &RateLimiters) -> Router {
    router::build(test_state(source), limiters)
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("router is infallible")
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be json")
}
