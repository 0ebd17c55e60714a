//! src/services/lighting_service.rs
//!
//! LightingService — the shared core behind every lifecycle operation:
//! the SQLite pool, the error taxonomy, the ownership gate, and the row
//! fetch helpers the per-entity modules build on. Mutations that cascade
//! (group power/brightness push-down, bulb→group convergence) run inside
//! a single transaction so partial propagation is never persisted.

use std::sync::Arc;

use serde::Deserialize;
use sqlx::{Executor, Sqlite, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::Identity,
    mailer::Mailer,
    models::{
        bulb::Bulb,
        group::Group,
        location::{Location, LocationRef},
        scene::Scene,
        share::SharedControl,
        user::User,
    },
};

#[derive(Debug, Error)]
pub enum LightingError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("not authorized to manage this {0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    InvalidValue(String),

    #[error("{field} already in use")]
    AlreadyTaken { field: &'static str },

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type LightingResult<T> = Result<T, LightingError>;

/// LightingService provides the resource lifecycle operations:
/// - Users: registration, confirmation, self-scoped read/update/delete
/// - Locations, bulbs, groups, scenes: owner-scoped CRUD
/// - Power/brightness changes with bulb↔group propagation
/// - The shared-control stub
///
/// Every operation takes the resolved [`Identity`] as an explicit argument;
/// nothing in the service reads ambient session state.
#[derive(Clone)]
pub struct LightingService {
    /// Shared SQLite connection pool holding all persistent state.
    pub db: Arc<SqlitePool>,

    /// Confirmation-mail hook used by the onboarding flow.
    pub mailer: Mailer,
}

impl LightingService {
    /// Create a new LightingService backed by the provided SQLite pool.
    pub fn new(db: Arc<SqlitePool>, mailer: Mailer) -> Self {
        Self { db, mailer }
    }
}

/// The permission gate: a resource may be read or mutated only by the user
/// whose id matches its `owner_id`. Deliberately checks direct ownership
/// only — it never walks up to the owning location's owner.
pub(crate) fn ensure_owner(
    identity: &Identity,
    owner_id: Uuid,
    entity: &'static str,
) -> LightingResult<()> {
    if identity.id == owner_id {
        Ok(())
    } else {
        Err(LightingError::Unauthorized(entity))
    }
}

/// Payload of the dedicated power endpoints. The wire form is numeric:
/// `{"state": 0}` or `{"state": 1}`.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SetPower {
    pub state: Option<i64>,
}

/// Translate the power wire form into the stored flag; anything outside
/// {0, 1} is rejected.
pub(crate) fn parse_power_state(state: Option<i64>) -> LightingResult<bool> {
    match state {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        Some(other) => Err(LightingError::InvalidValue(format!(
            "power state must be 0 or 1, got {other}"
        ))),
        None => Err(LightingError::MissingField("state")),
    }
}

/// Fetch a user row, mapping a missing row to NotFound.
pub(crate) async fn fetch_user<'e, E>(ex: E, id: Uuid) -> LightingResult<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        "SELECT id, nickname, email, password_hash, api_key, confirmed,
                confirm_token, last_location, created_at, confirmed_at
         FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_one(ex)
    .await
    .map_err(|err| match err {
        sqlx::Error::RowNotFound => LightingError::NotFound { entity: "user", id },
        other => LightingError::Sqlx(other),
    })
}

/// Fetch a location row, mapping a missing row to NotFound.
pub(crate) async fn fetch_location<'e, E>(ex: E, id: Uuid) -> LightingResult<Location>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Location>("SELECT id, name, owner_id FROM locations WHERE id = ?")
        .bind(id)
        .fetch_one(ex)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => LightingError::NotFound {
                entity: "location",
                id,
            },
            other => LightingError::Sqlx(other),
        })
}

/// Fetch a group row, mapping a missing row to NotFound.
pub(crate) async fn fetch_group<'e, E>(ex: E, id: Uuid) -> LightingResult<Group>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Group>(
        "SELECT id, name, owner_id, location_id, power, brightness
         FROM groups WHERE id = ?",
    )
    .bind(id)
    .fetch_one(ex)
    .await
    .map_err(|err| match err {
        sqlx::Error::RowNotFound => LightingError::NotFound { entity: "group", id },
        other => LightingError::Sqlx(other),
    })
}

/// Fetch a bulb row, mapping a missing row to NotFound.
pub(crate) async fn fetch_bulb<'e, E>(ex: E, id: Uuid) -> LightingResult<Bulb>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Bulb>(
        "SELECT id, name, bulb_type, owner_id, location_id, group_id, power, brightness
         FROM bulbs WHERE id = ?",
    )
    .bind(id)
    .fetch_one(ex)
    .await
    .map_err(|err| match err {
        sqlx::Error::RowNotFound => LightingError::NotFound { entity: "bulb", id },
        other => LightingError::Sqlx(other),
    })
}

/// Fetch a scene row, mapping a missing row to NotFound.
pub(crate) async fn fetch_scene<'e, E>(ex: E, id: Uuid) -> LightingResult<Scene>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Scene>("SELECT id, name, owner_id FROM scenes WHERE id = ?")
        .bind(id)
        .fetch_one(ex)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => LightingError::NotFound { entity: "scene", id },
            other => LightingError::Sqlx(other),
        })
}

/// Fetch a shared-control row, mapping a missing row to NotFound.
pub(crate) async fn fetch_share<'e, E>(ex: E, id: Uuid) -> LightingResult<SharedControl>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, SharedControl>(
        "SELECT id, email, location_id FROM shared_controls WHERE id = ?",
    )
    .bind(id)
    .fetch_one(ex)
    .await
    .map_err(|err| match err {
        sqlx::Error::RowNotFound => LightingError::NotFound { entity: "share", id },
        other => LightingError::Sqlx(other),
    })
}

/// Build the nested location reference for a representation. A dangling
/// location_id yields the error-object variant — reads never fail over an
/// orphaned reference.
pub(crate) async fn location_ref<'e, E>(ex: E, location_id: Uuid) -> LightingResult<LocationRef>
where
    E: Executor<'e, Database = Sqlite>,
{
    let location =
        sqlx::query_as::<_, Location>("SELECT id, name, owner_id FROM locations WHERE id = ?")
            .bind(location_id)
            .fetch_optional(ex)
            .await?;

    Ok(match location {
        Some(location) => LocationRef::known(&location),
        None => LocationRef::missing(),
    })
}

/// Return true if the SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// Best-effort extraction of the violated user column for the error
/// message. SQLite reports e.g. "UNIQUE constraint failed: users.nickname".
pub(crate) fn unique_violation_field(err: &sqlx::Error) -> &'static str {
    if let sqlx::Error::Database(db_err) = err {
        let message = db_err.message();
        for field in ["nickname", "email", "api_key"] {
            if message.contains(field) {
                return field;
            }
        }
    }
    "nickname or email"
}
