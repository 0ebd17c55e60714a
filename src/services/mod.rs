//! Service layer: one `LightingService` whose operations are split per
//! entity. All business rules — required-field validation, the ownership
//! gate, and bulb↔group propagation — live here; handlers stay thin.

pub mod bulbs;
pub mod groups;
pub mod lighting_service;
pub mod locations;
pub mod scenes;
pub mod shares;
pub mod users;

#[cfg(test)]
pub(crate) mod test_utils;
