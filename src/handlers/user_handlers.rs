//! HTTP handlers for account routes. Registration and confirmation are the
//! only unauthenticated endpoints under `/api/a/`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    auth::Identity,
    errors::AppError,
    handlers::created,
    services::{
        lighting_service::LightingService,
        users::{ConfirmUser, DeleteUser, RegisterUser, UpdateUser},
    },
};

/// POST `/api/a/user` — register an account.
pub async fn register_user(
    State(service): State<LightingService>,
    Json(payload): Json<RegisterUser>,
) -> Result<impl IntoResponse, AppError> {
    let repr = service.register_user(payload).await?;
    Ok(created(format!("/api/a/user/{}", repr.id), repr))
}

/// POST `/api/a/user/confirm` — consume a confirmation token.
pub async fn confirm_user(
    State(service): State<LightingService>,
    Json(payload): Json<ConfirmUser>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.confirm_user(payload).await?))
}

/// GET `/api/a/user/{id}` — read the caller's own account.
pub async fn read_user(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_user(&identity, id).await?))
}

/// PUT/PATCH `/api/a/user` — update the caller's own account.
pub async fn update_user(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<UpdateUser>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.update_user(&identity, payload).await?))
}

/// DELETE `/api/a/user` — delete the caller's own account.
pub async fn delete_user(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<DeleteUser>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_user(&identity, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
