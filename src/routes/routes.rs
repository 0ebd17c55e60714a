//! Defines the JSON API routes.
//!
//! ## Structure
//! - **Health endpoints** (unauthenticated)
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness (SQLite check)
//!
//! - **Account endpoints**
//!   - `POST /api/a/user`          — register (unauthenticated)
//!   - `POST /api/a/user/confirm`  — consume a confirmation token (unauthenticated)
//!   - `GET  /api/a/user/{id}`     — read own account
//!   - `PUT/PATCH/DELETE /api/a/user` — update/delete own account (id in body)
//!
//! - **Resource endpoints** (`location`, `bulb`, `group`, `scene`), all
//!   bearer-authenticated; collection paths carry create/list plus
//!   update/delete with the target id in the request body:
//!   - `GET/POST/PUT/PATCH/DELETE /api/a/<entity>`
//!   - `GET /api/a/<entity>/{id}`
//!   - `GET/POST/PUT/PATCH /api/a/{bulb,group}/{id}/power` — state endpoints
//!
//! - **Shared control** (stub)
//!   - `POST/DELETE /api/a/share`

use crate::{
    handlers::{
        bulb_handlers::{
            create_bulb, delete_bulb, list_bulbs, read_bulb, read_bulb_power, set_bulb_power,
            update_bulb,
        },
        group_handlers::{
            create_group, delete_group, list_groups, read_group, read_group_power,
            set_group_power, update_group,
        },
        health_handlers::{healthz, readyz},
        location_handlers::{
            create_location, delete_location, list_locations, read_location, update_location,
        },
        scene_handlers::{create_scene, delete_scene, list_scenes, read_scene, update_scene},
        share_handlers::{create_share, delete_share},
        user_handlers::{confirm_user, delete_user, read_user, register_user, update_user},
    },
    services::lighting_service::LightingService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the whole API.
///
/// The router carries shared state (`LightingService`) to all handlers;
/// authenticated handlers pull the identity out of the bearer token via the
/// `Identity` extractor.
pub fn routes() -> Router<LightingService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // accounts
        .route(
            "/api/a/user",
            post(register_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/api/a/user/confirm", post(confirm_user))
        .route("/api/a/user/{id}", get(read_user))
        // locations
        .route(
            "/api/a/location",
            get(list_locations)
                .post(create_location)
                .put(update_location)
                .patch(update_location)
                .delete(delete_location),
        )
        .route("/api/a/location/{id}", get(read_location))
        // bulbs
        .route(
            "/api/a/bulb",
            get(list_bulbs)
                .post(create_bulb)
                .put(update_bulb)
                .patch(update_bulb)
                .delete(delete_bulb),
        )
        .route("/api/a/bulb/{id}", get(read_bulb))
        .route(
            "/api/a/bulb/{id}/power",
            get(read_bulb_power)
                .post(set_bulb_power)
                .put(set_bulb_power)
                .patch(set_bulb_power),
        )
        // groups
        .route(
            "/api/a/group",
            get(list_groups)
                .post(create_group)
                .put(update_group)
                .patch(update_group)
                .delete(delete_group),
        )
        .route("/api/a/group/{id}", get(read_group))
        .route(
            "/api/a/group/{id}/power",
            get(read_group_power)
                .post(set_group_power)
                .put(set_group_power)
                .patch(set_group_power),
        )
        // scenes
        .route(
            "/api/a/scene",
            get(list_scenes)
                .post(create_scene)
                .put(update_scene)
                .patch(update_scene)
                .delete(delete_scene),
        )
        .route("/api/a/scene/{id}", get(read_scene))
        // shared control (stub)
        .route("/api/a/share", post(create_share).delete(delete_share))
}
