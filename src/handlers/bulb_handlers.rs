//! HTTP handlers for bulb routes, including the dedicated power endpoints
//! that speak the `{"state": 0|1}` wire form.

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
        bulbs::{CreateBulb, DeleteBulb, UpdateBulb},
        lighting_service::{LightingService, SetPower},
    },
};

/// POST `/api/a/bulb` — create a bulb.
pub async fn create_bulb(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<CreateBulb>,
) -> Result<impl IntoResponse, AppError> {
    let repr = service.create_bulb(&identity, payload).await?;
    Ok(created(format!("/api/a/bulb/{}", repr.id), repr))
}

/// GET `/api/a/bulb` — list the caller's bulbs.
pub async fn list_bulbs(
    State(service): State<LightingService>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.list_bulbs(&identity).await?))
}

/// GET `/api/a/bulb/{id}` — full representation.
pub async fn read_bulb(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_bulb(&identity, id).await?))
}

/// PUT/PATCH `/api/a/bulb` — apply settable fields; a power value runs the
/// group convergence rule.
pub async fn update_bulb(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<UpdateBulb>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.update_bulb(&identity, payload).await?))
}

/// DELETE `/api/a/bulb` — delete a bulb.
pub async fn delete_bulb(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<DeleteBulb>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_bulb(&identity, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/a/bulb/{id}/power` — state representation.
pub async fn read_bulb_power(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_bulb_power(&identity, id).await?))
}

/// POST/PUT/PATCH `/api/a/bulb/{id}/power` — set power from `{"state": 0|1}`.
pub async fn set_bulb_power(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPower>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.set_bulb_power(&identity, id, payload).await?))
}
