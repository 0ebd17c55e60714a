//! src/services/bulbs.rs
//!
//! Bulb lifecycle plus the upward half of the propagation engine: after a
//! bulb's power changes, its group converges to the new value only when no
//! member still shows the previous one.

use serde::Deserialize;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::{
    auth::Identity,
    models::{
        bulb::{Bulb, BulbRepr, BulbState},
        group::Group,
    },
    services::lighting_service::{
        LightingError, LightingResult, LightingService, SetPower, ensure_owner, fetch_bulb,
        fetch_group, fetch_location, location_ref, parse_power_state,
    },
};

/// Creation payload. Fields are optional at the serde layer so a missing
/// one surfaces as a MissingField error instead of a deserialization
/// failure; name, bulb_type and location_id are required.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateBulb {
    pub name: Option<String>,
    pub bulb_type: Option<String>,
    pub location_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub power: Option<bool>,
    pub brightness: Option<i64>,
}

/// Settable bulb fields. Anything else in the payload is ignored, and an
/// absent field is left as it was (there is no way to null a field out).
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateBulb {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub bulb_type: Option<String>,
    pub location_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub power: Option<bool>,
    pub brightness: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DeleteBulb {
    pub id: Option<Uuid>,
}

impl LightingService {
    async fn bulb_repr(&self, identity: &Identity, bulb: Bulb) -> LightingResult<BulbRepr> {
        let location = location_ref(&*self.db, bulb.location_id).await?;
        Ok(BulbRepr {
            id: bulb.id,
            name: bulb.name,
            bulb_type: bulb.bulb_type,
            owner: identity.user_ref(),
            location,
            group_id: bulb.group_id,
            power: bulb.power,
            brightness: bulb.brightness,
        })
    }

    /// Create a bulb inside an owned location, optionally already assigned
    /// to an owned group. Initial power/brightness are stored as given and
    /// never propagate.
    pub async fn create_bulb(
        &self,
        identity: &Identity,
        payload: CreateBulb,
    ) -> LightingResult<BulbRepr> {
        let name = payload.name.ok_or(LightingError::MissingField("name"))?;
        let bulb_type = payload
            .bulb_type
            .ok_or(LightingError::MissingField("bulb_type"))?;
        let location_id = payload
            .location_id
            .ok_or(LightingError::MissingField("location_id"))?;

        let location = fetch_location(&*self.db, location_id).await?;
        ensure_owner(identity, location.owner_id, "location")?;
        if let Some(group_id) = payload.group_id {
            let group = fetch_group(&*self.db, group_id).await?;
            ensure_owner(identity, group.owner_id, "group")?;
        }

        let bulb = Bulb {
            id: Uuid::new_v4(),
            name,
            bulb_type,
            owner_id: identity.id,
            location_id,
            group_id: payload.group_id,
            power: payload.power,
            brightness: payload.brightness,
        };

        sqlx::query(
            "INSERT INTO bulbs (id, name, bulb_type, owner_id, location_id, group_id, power, brightness)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bulb.id)
        .bind(&bulb.name)
        .bind(&bulb.bulb_type)
        .bind(bulb.owner_id)
        .bind(bulb.location_id)
        .bind(bulb.group_id)
        .bind(bulb.power)
        .bind(bulb.brightness)
        .execute(&*self.db)
        .await?;

        self.bulb_repr(identity, bulb).await
    }

    /// List the caller's own bulbs.
    pub async fn list_bulbs(&self, identity: &Identity) -> LightingResult<Vec<BulbRepr>> {
        let rows = sqlx::query_as::<_, Bulb>(
            "SELECT id, name, bulb_type, owner_id, location_id, group_id, power, brightness
             FROM bulbs WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(identity.id)
        .fetch_all(&*self.db)
        .await?;

        let mut reprs = Vec::with_capacity(rows.len());
        for bulb in rows {
            reprs.push(self.bulb_repr(identity, bulb).await?);
        }
        Ok(reprs)
    }

    pub async fn read_bulb(&self, identity: &Identity, id: Uuid) -> LightingResult<BulbRepr> {
        let bulb = fetch_bulb(&*self.db, id).await?;
        ensure_owner(identity, bulb.owner_id, "bulb")?;
        self.bulb_repr(identity, bulb).await
    }

    /// Apply the settable fields, then run the group convergence rule when
    /// the payload carried a power value. All writes share one transaction.
    pub async fn update_bulb(
        &self,
        identity: &Identity,
        payload: UpdateBulb,
    ) -> LightingResult<BulbRepr> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let mut bulb = fetch_bulb(&*self.db, id).await?;
        ensure_owner(identity, bulb.owner_id, "bulb")?;

        if let Some(location_id) = payload.location_id {
            let location = fetch_location(&*self.db, location_id).await?;
            ensure_owner(identity, location.owner_id, "location")?;
            bulb.location_id = location_id;
        }
        if let Some(group_id) = payload.group_id {
            let group = fetch_group(&*self.db, group_id).await?;
            ensure_owner(identity, group.owner_id, "group")?;
            bulb.group_id = Some(group_id);
        }
        if let Some(name) = payload.name {
            bulb.name = name;
        }
        if let Some(bulb_type) = payload.bulb_type {
            bulb.bulb_type = bulb_type;
        }
        if let Some(brightness) = payload.brightness {
            bulb.brightness = Some(brightness);
        }

        let previous_power = bulb.power;
        if let Some(power) = payload.power {
            bulb.power = Some(power);
        }

        let mut tx = self.db.begin().await?;
        sqlx::query(
            "UPDATE bulbs SET name = ?, bulb_type = ?, location_id = ?, group_id = ?,
                              power = ?, brightness = ?
             WHERE id = ?",
        )
        .bind(&bulb.name)
        .bind(&bulb.bulb_type)
        .bind(bulb.location_id)
        .bind(bulb.group_id)
        .bind(bulb.power)
        .bind(bulb.brightness)
        .bind(bulb.id)
        .execute(&mut *tx)
        .await?;

        if payload.power.is_some() {
            converge_group_power(&mut tx, &bulb, previous_power).await?;
        }
        tx.commit().await?;

        self.bulb_repr(identity, bulb).await
    }

    /// Delete a bulb. The owning group's aggregate state is not recomputed.
    pub async fn delete_bulb(&self, identity: &Identity, payload: DeleteBulb) -> LightingResult<()> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let bulb = fetch_bulb(&*self.db, id).await?;
        ensure_owner(identity, bulb.owner_id, "bulb")?;

        sqlx::query("DELETE FROM bulbs WHERE id = ?")
            .bind(bulb.id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }

    pub async fn read_bulb_power(&self, identity: &Identity, id: Uuid) -> LightingResult<BulbState> {
        let bulb = fetch_bulb(&*self.db, id).await?;
        ensure_owner(identity, bulb.owner_id, "bulb")?;
        Ok(BulbState::of(&bulb))
    }

    /// Set a single bulb's power and converge the owning group.
    pub async fn set_bulb_power(
        &self,
        identity: &Identity,
        id: Uuid,
        payload: SetPower,
    ) -> LightingResult<BulbState> {
        let power = parse_power_state(payload.state)?;
        let mut bulb = fetch_bulb(&*self.db, id).await?;
        ensure_owner(identity, bulb.owner_id, "bulb")?;

        let previous_power = bulb.power;
        bulb.power = Some(power);

        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE bulbs SET power = ? WHERE id = ?")
            .bind(bulb.power)
            .bind(bulb.id)
            .execute(&mut *tx)
            .await?;
        converge_group_power(&mut tx, &bulb, previous_power).await?;
        tx.commit().await?;

        Ok(BulbState::of(&bulb))
    }
}

/// The upward convergence rule, run after a bulb's power write and inside
/// the same transaction: if the bulb has a group whose row still exists,
/// and no member bulb still holds the bulb's previous value, the group's
/// power becomes the bulb's new value. Any member retaining the old value
/// means the group is mixed and stays untouched. A dangling group_id skips
/// the step entirely.
async fn converge_group_power(
    tx: &mut Transaction<'_, Sqlite>,
    bulb: &Bulb,
    previous_power: Option<bool>,
) -> LightingResult<()> {
    let Some(group_id) = bulb.group_id else {
        return Ok(());
    };

    let group = sqlx::query_as::<_, Group>(
        "SELECT id, name, owner_id, location_id, power, brightness FROM groups WHERE id = ?",
    )
    .bind(group_id)
    .fetch_optional(&mut **tx)
    .await?;
    let Some(group) = group else {
        return Ok(());
    };

    let members = sqlx::query_as::<_, Bulb>(
        "SELECT id, name, bulb_type, owner_id, location_id, group_id, power, brightness
         FROM bulbs WHERE group_id = ?",
    )
    .bind(group.id)
    .fetch_all(&mut **tx)
    .await?;

    if members.iter().any(|member| member.power == previous_power) {
        return Ok(());
    }

    sqlx::query("UPDATE groups SET power = ? WHERE id = ?")
        .bind(bulb.power)
        .bind(group.id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
