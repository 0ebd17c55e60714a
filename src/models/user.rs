//! Represents a registered account — the owner of locations, bulbs, groups
//! and scenes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A user account row.
///
/// Users own every other entity in the system; the ownership gate compares
/// a resource's `owner_id` against the acting user's id. The password is
/// only ever stored as an argon2id hash, and the row form is deliberately
/// not serializable.
#[derive(Clone, FromRow, Debug)]
pub struct User {
    /// Unique identifier (UUID, internal and external).
    pub id: Uuid,

    /// Display handle, unique across the system.
    pub nickname: String,

    /// Contact address, unique across the system.
    pub email: String,

    /// argon2id hash of the password; never leaves the row form.
    pub password_hash: String,

    /// Opaque bearer token resolving API requests to this user.
    pub api_key: String,

    /// Whether the confirmation mail round-trip has completed.
    pub confirmed: bool,

    /// Outstanding confirmation token; cleared once consumed.
    pub confirm_token: Option<String>,

    /// Location the user last interacted with (UI convenience state).
    pub last_location: Option<Uuid>,

    /// When the account was registered.
    pub created_at: DateTime<Utc>,

    /// When the account was confirmed, if it has been.
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Nested owner reference embedded in other entities' representations.
#[derive(Serialize, Clone, Debug)]
pub struct UserRef {
    pub id: Uuid,
    pub nickname: String,
}

/// Canonical external representation of a user.
///
/// Returned only to the user themself (user reads are self-scoped), which
/// is why it may carry the api_key. The password hash never appears.
#[derive(Serialize, Debug)]
pub struct UserRepr {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub confirmed: bool,
    pub api_key: String,
    pub last_location: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserRepr {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            email: user.email,
            confirmed: user.confirmed,
            api_key: user.api_key,
            last_location: user.last_location,
            created_at: user.created_at,
        }
    }
}
