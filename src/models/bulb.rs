//! Represents a bulb — the leaf entity whose power and brightness the
//! service actually controls.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{location::LocationRef, power_label, user::UserRef};

/// A bulb row.
///
/// Bulbs are passive database state: there is no protocol integration, so a
/// row's power/brightness are the source of truth. Power is nullable — a
/// bulb created without an explicit value has undefined power, which the
/// state form labels "Error".
#[derive(Clone, FromRow, Debug)]
pub struct Bulb {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name chosen by the owner.
    pub name: String,

    /// Free-form hardware type ("dimmable", "rgbw", ...).
    pub bulb_type: String,

    /// Owning user.
    pub owner_id: Uuid,

    /// Location the bulb belongs to. Always set on the row, though the
    /// referenced location may have been deleted since.
    pub location_id: Uuid,

    /// Optional group membership; may dangle after a group delete.
    pub group_id: Option<Uuid>,

    /// On/off flag, NULL until first set.
    pub power: Option<bool>,

    /// Brightness value, NULL until first set.
    pub brightness: Option<i64>,
}

/// Canonical external representation of a bulb.
#[derive(Serialize, Debug)]
pub struct BulbRepr {
    pub id: Uuid,
    pub name: String,
    pub bulb_type: String,
    pub owner: UserRef,
    pub location: LocationRef,
    pub group_id: Option<Uuid>,
    pub power: Option<bool>,
    pub brightness: Option<i64>,
}

/// Minimal state form returned by the power endpoints: identity plus power
/// as both the raw flag and a human label.
#[derive(Serialize, Debug)]
pub struct BulbState {
    pub id: Uuid,
    pub name: String,
    pub power: Option<bool>,
    pub state: &'static str,
}

impl BulbState {
    pub fn of(bulb: &Bulb) -> Self {
        Self {
            id: bulb.id,
            name: bulb.name.clone(),
            power: bulb.power,
            state: power_label(bulb.power),
        }
    }
}
