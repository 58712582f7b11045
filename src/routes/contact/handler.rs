use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::model::{Contact, CreateContactRequest, CreateContactResponse};
use crate::{
    AppState,
    common::{PageQuery, Paginated, Pagination},
    error::AppError,
    extract::{JsonBody, Path, Query},
};

pub async fn submit_contact(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.into()))?;

    let contact = Contact::create(&state.pool, req).await?;
    tracing::info!(id = %contact.id, "Stored contact submission");

    Ok((
        StatusCode::CREATED,
        Json(CreateContactResponse {
            message: "signal received",
            id: contact.id,
        }),
    ))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::from_query(&page);

    let total = Contact::count(&state.pool).await?;
    let contacts = Contact::list(&state.pool, pagination).await?;

    Ok(Json(Paginated::new(contacts, total, pagination)))
}

pub async fn mark_contact_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Contact::toggle_read(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("contact not found".into()))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !Contact::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("contact not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
