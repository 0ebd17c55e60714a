//! HTTP handlers: thin adapters between the wire contract and the service
//! layer. Each one resolves the acting identity (registration, confirmation
//! and the health probes excepted), hands the deserialized payload to
//! `LightingService`, and maps the result onto a status code.

pub mod bulb_handlers;
pub mod group_handlers;
pub mod health_handlers;
pub mod location_handlers;
pub mod scene_handlers;
pub mod share_handlers;
pub mod user_handlers;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// 201 with the standard `Location: /api/a/<entity>/<id>` reference header.
pub(crate) fn created<T: Serialize>(path: String, body: T) -> Response {
    (StatusCode::CREATED, [(header::LOCATION, path)], Json(body)).into_response()
}
