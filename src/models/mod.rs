//! Core data models for the light bulb control service.
//!
//! Each entity maps to a database table via `sqlx::FromRow`. The structs
//! here are the internal row forms; every entity also carries its canonical
//! external representation (`*Repr`) and, for bulbs and groups, the minimal
//! state form returned by the power endpoints. Row structs are never
//! serialized directly, so secrets such as password hashes stay internal.

pub mod bulb;
pub mod group;
pub mod location;
pub mod scene;
pub mod share;
pub mod user;

/// Human-readable power label used by the state representations.
/// An undefined (NULL) power reads as "Error".
pub fn power_label(power: Option<bool>) -> &'static str {
    match power {
        Some(true) => "On",
        Some(false) => "Off",
        None => "Error",
    }
}
