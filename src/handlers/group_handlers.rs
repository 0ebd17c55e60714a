//! HTTP handlers for group routes. Group-level power and brightness writes
//! propagate to every member bulb inside the service.

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
        groups::{CreateGroup, DeleteGroup, UpdateGroup},
        lighting_service::{LightingService, SetPower},
    },
};

/// POST `/api/a/group` — create a group and claim its member bulbs.
pub async fn create_group(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<CreateGroup>,
) -> Result<impl IntoResponse, AppError> {
    let repr = service.create_group(&identity, payload).await?;
    Ok(created(format!("/api/a/group/{}", repr.id), repr))
}

/// GET `/api/a/group` — list the caller's groups.
pub async fn list_groups(
    State(service): State<LightingService>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.list_groups(&identity).await?))
}

/// GET `/api/a/group/{id}` — full representation with member ids.
pub async fn read_group(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_group(&identity, id).await?))
}

/// PUT/PATCH `/api/a/group` — apply settable fields; power/brightness are
/// pushed down to the members.
pub async fn update_group(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<UpdateGroup>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.update_group(&identity, payload).await?))
}

/// DELETE `/api/a/group` — delete a group; members keep their dangling
/// reference.
pub async fn delete_group(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<DeleteGroup>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_group(&identity, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/a/group/{id}/power` — state representation.
pub async fn read_group_power(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_group_power(&identity, id).await?))
}

/// POST/PUT/PATCH `/api/a/group/{id}/power` — set power from
/// `{"state": 0|1}` and overwrite every member bulb.
pub async fn set_group_power(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPower>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.set_group_power(&identity, id, payload).await?))
}
