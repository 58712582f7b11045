use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    config::Config,
    middleware::{
        RateLimiters, auth_middleware, log_errors, log_requests, rate_limit, security_headers,
    },
    routes::{self, admin, contact, newsletter, patreon, post as posts, project, user},
};

pub const MAX_BODY_BYTES: usize = 1 << 20;

pub fn build(state: AppState, limiters: &RateLimiters) -> Router {
    let login_limit = from_fn_with_state(limiters.login.clone(), rate_limit);
    let form_limit = from_fn_with_state(limiters.public_form.clone(), rate_limit);

    // 公开路由；/projects/{id} 与 /posts/{id} 在这里按 slug 查询
    let public_routes = Router::new()
        .route("/auth/login", post(user::login).layer(login_limit))
        .route("/projects", get(project::list_projects))
        .route("/projects/{id}", get(project::get_project))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post))
        .route(
            "/contacts",
            post(contact::submit_contact).layer(form_limit.clone()),
        )
        .route(
            "/newsletter/subscribe",
            post(newsletter::subscribe).layer(form_limit.clone()),
        )
        .route(
            "/newsletter/unsubscribe",
            post(newsletter::unsubscribe).layer(form_limit),
        )
        .route("/patreon", get(patreon::get_campaign));

    let protected_routes = Router::new()
        .route("/auth/me", get(user::me))
        .route("/admin/stats", get(admin::dashboard_stats))
        .route("/projects", post(project::create_project))
        .route(
            "/projects/{id}",
            put(project::update_project).delete(project::delete_project),
        )
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/contacts", get(contact::list_contacts))
        .route("/contacts/{id}/read", patch(contact::mark_contact_read))
        .route(
            "/contacts/{id}",
            axum::routing::delete(contact::delete_contact),
        )
        .route(
            "/newsletter/subscribers",
            get(newsletter::list_subscribers),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/healthz", get(routes::health))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(log_requests))
                .layer(from_fn(log_errors))
                .layer(from_fn(security_headers))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
                .layer(from_fn_with_state(limiters.general.clone(), rate_limit))
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}
