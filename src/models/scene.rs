//! Represents a scene — a named snapshot of per-bulb settings.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::UserRef;

/// A scene row. The per-bulb values live in `scene_bulbs`.
#[derive(Clone, FromRow, Debug)]
pub struct Scene {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name chosen by the owner.
    pub name: String,

    /// Owning user.
    pub owner_id: Uuid,
}

/// One snapshot entry: the brightness/color a scene records for a bulb.
/// Values are captured at scene creation or update, not kept in sync with
/// the bulb afterwards.
#[derive(Clone, FromRow, Debug)]
pub struct SceneBulb {
    /// Scene the entry belongs to.
    pub scene_id: Uuid,

    /// Bulb the entry targets; may dangle after a bulb delete.
    pub bulb_id: Uuid,

    /// Recorded brightness override, if any.
    pub brightness: Option<i64>,

    /// Recorded color override (e.g. "#ffaa00"), if any.
    pub color: Option<String>,
}

/// Canonical external representation of a scene.
#[derive(Serialize, Debug)]
pub struct SceneRepr {
    pub id: Uuid,
    pub name: String,
    pub owner: UserRef,
    pub bulbs: Vec<SceneBulbRepr>,
}

/// Snapshot entry as exposed in the scene representation.
#[derive(Serialize, Debug)]
pub struct SceneBulbRepr {
    pub id: Uuid,
    pub brightness: Option<i64>,
    pub color: Option<String>,
}

impl From<SceneBulb> for SceneBulbRepr {
    fn from(entry: SceneBulb) -> Self {
        Self {
            id: entry.bulb_id,
            brightness: entry.brightness,
            color: entry.color,
        }
    }
}
