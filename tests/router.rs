mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{MockSource, admin_token, body_json, limiters, send, test_app, test_config};
use serde_json::json;
use subcult_api::{router::MAX_BODY_BYTES, utils::generate_token};

fn get(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, ip: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-forwarded-for", ip)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_auth(uri: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-real-ip", "10.0.0.1")
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn healthz_reports_ok_with_security_headers() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));

    let resp = send(&app, get("/healthz", "1.1.1.1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");

    let body = body_json(resp).await;
    assert_eq!(body, json!({ "status": "ok", "service": "subcult-api" }));
}

#[tokio::test]
async fn general_limiter_rejects_with_retry_after() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(2, 5, 10));

    for _ in 0..2 {
        let resp = send(&app, get("/healthz", "203.0.113.7")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(&app, get("/healthz", "203.0.113.7")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers()[header::RETRY_AFTER], "60");
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "error": "rate limit exceeded", "code": 429 }));

    // 其他客户端不受影响
    let resp = send(&app, get("/healthz", "203.0.113.8")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn forwarded_for_uses_first_address() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(1, 5, 10));

    let resp = send(&app, get("/healthz", "198.51.100.1, 10.0.0.1")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 同一个原始客户端，经过不同代理
    let resp = send(&app, get("/healthz", "198.51.100.1, 10.0.0.2")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn login_limiter_is_separate_from_general() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 1, 10));
    let creds = json!({ "username": "", "password": "" });

    let resp = send(&app, post_json("/api/v1/auth/login", "192.0.2.5", creds.clone())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "username and password are required");

    let resp = send(&app, post_json("/api/v1/auth/login", "192.0.2.5", creds)).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // 登录被限流后，其他接口仍可访问
    let resp = send(&app, get("/healthz", "192.0.2.5")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn form_limiter_guards_contact_submissions() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 1));
    let empty = json!({ "name": "", "email": "", "message": "" });

    let resp = send(&app, post_json("/api/v1/contacts", "192.0.2.9", empty.clone())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, post_json("/api/v1/newsletter/subscribe", "192.0.2.9", json!({}))).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));

    let resp = send(&app, get("/api/v1/admin/stats", "10.0.0.1")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "missing authorization header");

    let resp = send(&app, with_auth("/api/v1/admin/stats", "Basic abc")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "invalid authorization format");

    let resp = send(&app, with_auth("/api/v1/contacts", "Bearer not-a-jwt")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "error": "invalid or expired token", "code": 401 }));
}

#[tokio::test]
async fn valid_token_reaches_handler() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));
    let (token, _) = generate_token("not-a-uuid", "admin", "admin", &test_config()).unwrap();

    // 令牌校验通过，handler 拒绝非 UUID 的 sub，不会访问数据库
    let resp = send(&app, with_auth("/api/v1/auth/me", &format!("Bearer {token}"))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "invalid token claims");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));

    let resp = send(&app, get("/api/v1/nowhere", "10.0.0.3")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patreon_disabled_returns_empty_payload() {
    let source = Arc::new(MockSource::unconfigured());
    let app = test_app(source.clone(), &limiters(100, 5, 10));

    let resp = send(&app, get("/api/v1/patreon", "10.0.0.4")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "campaign": null, "tiers": [], "cached_at": null }));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn patreon_failure_without_cache_is_bad_gateway() {
    let app = test_app(Arc::new(MockSource::failing()), &limiters(100, 5, 10));

    let resp = send(&app, get("/api/v1/patreon", "10.0.0.5")).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "error": "failed to fetch Patreon data", "code": 502 }));
}

#[tokio::test]
async fn patreon_serves_cached_campaign() {
    let source = Arc::new(MockSource::new());
    let app = test_app(source.clone(), &limiters(100, 5, 10));

    for _ in 0..3 {
        let resp = send(&app, get("/api/v1/patreon", "10.0.0.6")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["campaign"]["patron_count"], 10);
        assert_eq!(body["tiers"][0]["amount_cents"], 500);
        assert!(body["cached_at"].is_string());
    }
    assert_eq!(source.calls(), 1);
}

fn raw_request(
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: impl Into<Body>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-real-ip", "10.0.0.9")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(body.into()).unwrap()
}

#[tokio::test]
async fn malformed_body_uses_error_envelope() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));

    let resp = send(&app, raw_request(Method::POST, "/api/v1/contacts", None, "{not json")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "error": "invalid request body", "code": 400 }));

    // 缺少 Content-Type 同样按请求体无效处理
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header("x-real-ip", "10.0.0.9")
        .body(Body::from(r#"{"username":"a","password":"b"}"#))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid request body");
}

#[tokio::test]
async fn oversized_body_is_rejected_with_envelope() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));
    let huge = format!(r#"{{"name":"{}"}}"#, "a".repeat(MAX_BODY_BYTES));

    let resp = send(&app, raw_request(Method::POST, "/api/v1/contacts", None, huge)).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "error": "request body too large", "code": 413 }));
}

#[tokio::test]
async fn malformed_id_uses_error_envelope() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));
    let token = admin_token();
    let project = json!({ "slug": "x", "name": "x" }).to_string();

    let resp = send(
        &app,
        raw_request(Method::PUT, "/api/v1/projects/not-a-uuid", Some(&token), project),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "error": "invalid id", "code": 400 }));

    let resp = send(
        &app,
        raw_request(Method::PATCH, "/api/v1/contacts/42/read", Some(&token), ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid id");
}

#[tokio::test]
async fn shared_item_paths_gate_only_admin_methods() {
    let app = test_app(Arc::new(MockSource::unconfigured()), &limiters(100, 5, 10));
    let id = "00000000-0000-0000-0000-0000000000aa";

    // 写操作需要令牌
    for (method, uri) in [
        (Method::PUT, format!("/api/v1/projects/{id}")),
        (Method::DELETE, format!("/api/v1/projects/{id}")),
        (Method::PUT, format!("/api/v1/posts/{id}")),
        (Method::DELETE, format!("/api/v1/posts/{id}")),
    ] {
        let resp = send(&app, raw_request(method.clone(), &uri, None, "{}")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body_json(resp).await["error"], "missing authorization header");
    }

    // 公开读取直达 handler，数据库不可用时是 500 而不是 401
    for uri in ["/api/v1/projects/some-slug", "/api/v1/posts/some-slug"] {
        let resp = send(&app, get(uri, "10.0.0.10")).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "GET {uri}");
        let body = body_json(resp).await;
        assert_eq!(body, json!({ "error": "internal server error", "code": 500 }));
    }
}
