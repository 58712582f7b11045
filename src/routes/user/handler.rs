use axum::{
    Json,
    extract::{Extension, State},
    response::IntoResponse,
};
use uuid::Uuid;

use super::model::{LoginRequest, LoginResponse, User};
use crate::{
    AppState,
    error::AppError,
    extract::JsonBody,
    utils::{Claims, generate_token},
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".into(),
        ));
    }

    // 用户不存在和密码错误返回同样的信息
    let user = User::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let valid = user.verify_login(&req.password).map_err(|e| {
        tracing::warn!(username = %user.username, "Password verification failed: {}", e);
        AppError::Unauthorized(INVALID_CREDENTIALS.into())
    })?;
    if !valid {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let (token, expires_at) =
        generate_token(&user.id.to_string(), &user.username, &user.role, &state.config)
            .map_err(|e| AppError::Internal(format!("failed to generate token: {}", e)))?;

    tracing::info!(username = %user.username, "Admin logged in");
    Ok(Json(LoginResponse {
        token,
        expires_at,
        user,
    }))
}

pub async fn me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid token claims".into()))?;

    User::find_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("user not found".into()))
}
