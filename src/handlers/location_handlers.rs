//! HTTP handlers for location routes.

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
        locations::{CreateLocation, DeleteLocation, UpdateLocation},
    },
};

/// POST `/api/a/location` — create a location.
pub async fn create_location(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<CreateLocation>,
) -> Result<impl IntoResponse, AppError> {
    let repr = service.create_location(&identity, payload).await?;
    Ok(created(format!("/api/a/location/{}", repr.id), repr))
}

/// GET `/api/a/location` — list the caller's locations.
pub async fn list_locations(
    State(service): State<LightingService>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.list_locations(&identity).await?))
}

/// GET `/api/a/location/{id}` — full representation.
pub async fn read_location(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_location(&identity, id).await?))
}

/// PUT/PATCH `/api/a/location` — rename a location.
pub async fn update_location(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<UpdateLocation>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.update_location(&identity, payload).await?))
}

/// DELETE `/api/a/location` — delete a location; contained bulbs and groups
/// keep their dangling reference.
pub async fn delete_location(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<DeleteLocation>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_location(&identity, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
