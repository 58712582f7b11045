use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{MessageResponse, SubscribeRequest, Subscriber, UnsubscribeRequest};
use crate::{
    AppState,
    common::{PageQuery, Paginated, Pagination},
    error::AppError,
    extract::{JsonBody, Query},
};

pub async fn subscribe(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".into()));
    }

    Subscriber::subscribe(&state.pool, email).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "subscribed, welcome to the signal",
        }),
    ))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UnsubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = req.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("unsubscribe token is required".into()));
    }

    if !Subscriber::unsubscribe(&state.pool, token).await? {
        return Err(AppError::NotFound(
            "invalid token or already unsubscribed".into(),
        ));
    }

    Ok(Json(MessageResponse {
        message: "unsubscribed, signal dropped",
    }))
}

pub async fn list_subscribers(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::from_query(&page);

    let total = Subscriber::count_active(&state.pool).await?;
    let subscribers = Subscriber::list_active(&state.pool, pagination).await?;

    Ok(Json(Paginated::new(subscribers, total, pagination)))
}
