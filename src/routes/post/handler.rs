use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::model::{Post, PostFilter, PostRequest};
use crate::{
    AppState,
    common::{PageQuery, Paginated, Pagination},
    error::AppError,
    extract::{JsonBody, Path, Query},
};

pub async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<PostFilter>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::from_query(&page);
    let only_published = filter.only_published();

    let total = Post::count(&state.pool, only_published).await?;
    let posts = Post::list(&state.pool, only_published, pagination).await?;

    Ok(Json(Paginated::new(posts, total, pagination)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Post::find_by_slug(&state.pool, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("post not found".into()))
}

pub async fn create_post(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PostRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.into()))?;

    let post = Post::create(&state.pool, req)
        .await
        .map_err(|e| AppError::from_write(e, "a post with this slug already exists"))?;

    tracing::info!(slug = %post.slug, "Created post");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<PostRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.into()))?;

    Post::update(&state.pool, id, req)
        .await
        .map_err(|e| AppError::from_write(e, "a post with this slug already exists"))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("post not found".into()))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !Post::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("post not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
