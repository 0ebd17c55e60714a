//! Represents a location — the top-level container bulbs and groups live in.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::UserRef;

/// A location row (a home, office, room — whatever the user calls it).
///
/// Locations are owned by exactly one user and contain bulbs and groups
/// through forward references on those rows. Deleting a location does not
/// cascade: contained rows keep their dangling `location_id`.
#[derive(Clone, FromRow, Debug)]
pub struct Location {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name chosen by the owner.
    pub name: String,

    /// Owning user.
    pub owner_id: Uuid,
}

/// Nested location reference embedded in bulb and group representations.
///
/// A dangling `location_id` (the location row was deleted) serializes as an
/// error object in place of the reference, instead of failing the read.
#[derive(Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum LocationRef {
    Known { id: Uuid, name: String },
    Missing { error: String },
}

impl LocationRef {
    pub fn known(location: &Location) -> Self {
        Self::Known {
            id: location.id,
            name: location.name.clone(),
        }
    }

    pub fn missing() -> Self {
        Self::Missing {
            error: "location no longer exists".into(),
        }
    }
}

/// Canonical external representation of a location.
#[derive(Serialize, Debug)]
pub struct LocationRepr {
    pub id: Uuid,
    pub name: String,
    pub owner: UserRef,
}
