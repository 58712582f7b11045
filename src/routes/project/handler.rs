use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::model::{Project, ProjectFilter, ProjectRequest};
use crate::{
    AppState,
    error::AppError,
    extract::{JsonBody, Path, Query},
};

pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Result<impl IntoResponse, AppError> {
    let projects = Project::list(&state.pool, &filter).await?;
    Ok(Json(projects))
}

// 公开路由按 slug 查询，路径参数与管理路由共用同一位置
pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Project::find_by_slug(&state.pool, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("project not found".into()))
}

pub async fn create_project(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.into()))?;

    let project = Project::create(&state.pool, req)
        .await
        .map_err(|e| AppError::from_write(e, "a project with this slug already exists"))?;

    tracing::info!(slug = %project.slug, "Created project");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<ProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.into()))?;

    Project::update(&state.pool, id, req)
        .await
        .map_err(|e| AppError::from_write(e, "a project with this slug already exists"))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("project not found".into()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !Project::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("project not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
