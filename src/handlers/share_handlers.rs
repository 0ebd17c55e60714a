//! HTTP handlers for shared-control routes. Grants are persisted and
//! deletable; nothing consults them yet.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    auth::Identity,
    errors::AppError,
    handlers::created,
    services::{
        lighting_service::LightingService,
        shares::{CreateShare, DeleteShare},
    },
};

/// POST `/api/a/share` — invite an email to an owned location.
pub async fn create_share(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<CreateShare>,
) -> Result<impl IntoResponse, AppError> {
    let repr = service.create_share(&identity, payload).await?;
    Ok(created(format!("/api/a/share/{}", repr.id), repr))
}

/// DELETE `/api/a/share` — revoke a grant.
pub async fn delete_share(
    State(service): State<LightingService>,
    identity: Identity,
    Json(payload): Json<DeleteShare>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_share(&identity, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
