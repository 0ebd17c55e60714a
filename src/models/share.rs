//! Represents a shared-control grant — an email invited to a location.
//!
//! These rows are persisted and deletable but consulted by no permission
//! check: ownership remains the only authorization rule. The entity exists
//! as the extension point for a future co-ownership model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::location::LocationRef;

/// A shared-control row linking a prospective co-owner's email to a
/// location.
#[derive(Clone, FromRow, Debug)]
pub struct SharedControl {
    /// Unique identifier.
    pub id: Uuid,

    /// Invited address; not required to match a registered user.
    pub email: String,

    /// Location being shared.
    pub location_id: Uuid,
}

/// Canonical external representation of a shared-control grant.
#[derive(Serialize, Debug)]
pub struct SharedControlRepr {
    pub id: Uuid,
    pub email: String,
    pub location: LocationRef,
}
