use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, utils::verify_token};

/// Validates the bearer token and stores its [`Claims`](crate::utils::Claims)
/// as a request extension for the admin handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".into()))?;

    let token = match auth_header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            token.trim()
        }
        _ => {
            return Err(AppError::Unauthorized(
                "invalid authorization format".into(),
            ));
        }
    };

    let claims = verify_token(token, &state.config).map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        AppError::Unauthorized("invalid or expired token".into())
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
