//! HTTP handlers for scene routes.

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
        scenes::{CreateScene, DeleteScene, UpdateScene},
    },
};

/// POST `/api/a/scene` — capture a snapshot of per-bulb settings.
pub async fn create_scene(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<CreateScene>,
) -> Result<impl IntoResponse, AppError> {
    let repr = service.create_scene(&identity, payload).await?;
    Ok(created(format!("/api/a/scene/{}", repr.id), repr))
}

/// GET `/api/a/scene` — list the caller's scenes.
pub async fn list_scenes(
    State(service): State<LightingService>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.list_scenes(&identity).await?))
}

/// GET `/api/a/scene/{id}` — full representation with snapshot entries.
pub async fn read_scene(
    State(service): State<LightingService>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.read_scene(&identity, id).await?))
}

/// PUT/PATCH `/api/a/scene` — rename or replace the snapshot.
pub async fn update_scene(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<UpdateScene>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.update_scene(&identity, payload).await?))
}

/// DELETE `/api/a/scene` — delete a scene and its snapshot rows.
pub async fn delete_scene(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<DeleteScene>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_scene(&identity, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
