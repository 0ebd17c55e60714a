//! Represents a group — a named set of bulbs that can be switched and
//! dimmed together.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{location::LocationRef, power_label, user::UserRef};

/// A group row.
///
/// Membership lives on the bulbs (`bulbs.group_id`); the group row itself
/// only carries the aggregate power/brightness the propagation engine keeps
/// consistent with the members. Like bulbs, power starts NULL.
#[derive(Clone, FromRow, Debug)]
pub struct Group {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name chosen by the owner.
    pub name: String,

    /// Owning user.
    pub owner_id: Uuid,

    /// Location the group belongs to; the referenced row may be gone.
    pub location_id: Uuid,

    /// Aggregate on/off flag, NULL until first set.
    pub power: Option<bool>,

    /// Aggregate brightness, NULL until first set.
    pub brightness: Option<i64>,
}

/// Canonical external representation of a group, including the current
/// member bulb ids (materialized by query, never stored).
#[derive(Serialize, Debug)]
pub struct GroupRepr {
    pub id: Uuid,
    pub name: String,
    pub owner: UserRef,
    pub location: LocationRef,
    pub power: Option<bool>,
    pub brightness: Option<i64>,
    pub bulbs: Vec<Uuid>,
}

/// Minimal state form for the group power endpoints.
#[derive(Serialize, Debug)]
pub struct GroupState {
    pub id: Uuid,
    pub name: String,
    pub power: Option<bool>,
    pub state: &'static str,
}

impl GroupState {
    pub fn of(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            power: group.power,
            state: power_label(group.power),
        }
    }
}
