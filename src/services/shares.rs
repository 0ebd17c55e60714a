//! src/services/shares.rs
//!
//! Shared-control grants: an email invited to a location. Rows can be
//! created and deleted by the location owner, but no permission check
//! consults them — ownership stays the only authorization rule. This is
//! the extension point for a future co-ownership model, nothing more.

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::Identity,
    models::share::{SharedControl, SharedControlRepr},
    services::lighting_service::{
        LightingError, LightingResult, LightingService, ensure_owner, fetch_location, fetch_share,
        location_ref,
    },
};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateShare {
    pub email: Option<String>,
    pub location_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DeleteShare {
    pub id: Option<Uuid>,
}

impl LightingService {
    /// Invite an email to a location the caller owns.
    pub async fn create_share(
        &self,
        identity: &Identity,
        payload: CreateShare,
    ) -> LightingResult<SharedControlRepr> {
        let email = payload.email.ok_or(LightingError::MissingField("email"))?;
        let location_id = payload
            .location_id
            .ok_or(LightingError::MissingField("location_id"))?;

        let location = fetch_location(&*self.db, location_id).await?;
        ensure_owner(identity, location.owner_id, "location")?;

        let share = SharedControl {
            id: Uuid::new_v4(),
            email,
            location_id,
        };

        sqlx::query("INSERT INTO shared_controls (id, email, location_id) VALUES (?, ?, ?)")
            .bind(share.id)
            .bind(&share.email)
            .bind(share.location_id)
            .execute(&*self.db)
            .await?;

        let location = location_ref(&*self.db, share.location_id).await?;
        Ok(SharedControlRepr {
            id: share.id,
            email: share.email,
            location,
        })
    }

    /// Revoke a grant. Gated on owning the referenced location, so a grant
    /// whose location has vanished can no longer be managed.
    pub async fn delete_share(
        &self,
        identity: &Identity,
        payload: DeleteShare,
    ) -> LightingResult<()> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let share = fetch_share(&*self.db, id).await?;

        let location = fetch_location(&*self.db, share.location_id).await?;
        ensure_owner(identity, location.owner_id, "location")?;

        sqlx::query("DELETE FROM shared_controls WHERE id = ?")
            .bind(share.id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}
