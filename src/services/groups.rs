//! src/services/groups.rs
//!
//! Group lifecycle plus the downward half of the propagation engine: a
//! group-level power or brightness write lands on the group row and is then
//! stamped onto every member bulb, no merging. Membership itself lives on
//! the bulbs (`bulbs.group_id`) and is reassigned here when a payload
//! carries a member list.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

use crate::{
    auth::Identity,
    models::group::{Group, GroupRepr, GroupState},
    services::lighting_service::{
        LightingError, LightingResult, LightingService, SetPower, ensure_owner, fetch_bulb,
        fetch_group, fetch_location, location_ref, parse_power_state,
    },
};

/// Creation payload; name, location_id and bulb_ids are required (an empty
/// member list is fine, an absent one is not).
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateGroup {
    pub name: Option<String>,
    pub location_id: Option<Uuid>,
    pub bulb_ids: Option<Vec<Uuid>>,
    pub power: Option<bool>,
    pub brightness: Option<i64>,
}

/// Settable group fields. A present bulb_ids list replaces the member set;
/// present power/brightness values are pushed down to the members.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateGroup {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub location_id: Option<Uuid>,
    pub bulb_ids: Option<Vec<Uuid>>,
    pub power: Option<bool>,
    pub brightness: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DeleteGroup {
    pub id: Option<Uuid>,
}

impl LightingService {
    async fn group_repr(&self, identity: &Identity, group: Group) -> LightingResult<GroupRepr> {
        let location = location_ref(&*self.db, group.location_id).await?;
        let bulbs =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM bulbs WHERE group_id = ? ORDER BY name")
                .bind(group.id)
                .fetch_all(&*self.db)
                .await?;
        Ok(GroupRepr {
            id: group.id,
            name: group.name,
            owner: identity.user_ref(),
            location,
            power: group.power,
            brightness: group.brightness,
            bulbs,
        })
    }

    /// Validate that every listed bulb exists and belongs to the caller.
    async fn check_member_bulbs(&self, identity: &Identity, bulb_ids: &[Uuid]) -> LightingResult<()> {
        for bulb_id in bulb_ids {
            let bulb = fetch_bulb(&*self.db, *bulb_id).await?;
            ensure_owner(identity, bulb.owner_id, "bulb")?;
        }
        Ok(())
    }

    /// Create a group and claim its member bulbs. Initial power/brightness
    /// are stored on the group row only; members keep their own state until
    /// the first group-level write.
    pub async fn create_group(
        &self,
        identity: &Identity,
        payload: CreateGroup,
    ) -> LightingResult<GroupRepr> {
        let name = payload.name.ok_or(LightingError::MissingField("name"))?;
        let location_id = payload
            .location_id
            .ok_or(LightingError::MissingField("location_id"))?;
        let bulb_ids = payload
            .bulb_ids
            .ok_or(LightingError::MissingField("bulb_ids"))?;

        let location = fetch_location(&*self.db, location_id).await?;
        ensure_owner(identity, location.owner_id, "location")?;
        self.check_member_bulbs(identity, &bulb_ids).await?;

        let group = Group {
            id: Uuid::new_v4(),
            name,
            owner_id: identity.id,
            location_id,
            power: payload.power,
            brightness: payload.brightness,
        };

        let mut tx = self.db.begin().await?;
        sqlx::query(
            "INSERT INTO groups (id, name, owner_id, location_id, power, brightness)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(group.owner_id)
        .bind(group.location_id)
        .bind(group.power)
        .bind(group.brightness)
        .execute(&mut *tx)
        .await?;
        assign_members(&mut tx, group.id, &bulb_ids).await?;
        tx.commit().await?;

        self.group_repr(identity, group).await
    }

    /// List the caller's own groups.
    pub async fn list_groups(&self, identity: &Identity) -> LightingResult<Vec<GroupRepr>> {
        let rows = sqlx::query_as::<_, Group>(
            "SELECT id, name, owner_id, location_id, power, brightness
             FROM groups WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(identity.id)
        .fetch_all(&*self.db)
        .await?;

        let mut reprs = Vec::with_capacity(rows.len());
        for group in rows {
            reprs.push(self.group_repr(identity, group).await?);
        }
        Ok(reprs)
    }

    pub async fn read_group(&self, identity: &Identity, id: Uuid) -> LightingResult<GroupRepr> {
        let group = fetch_group(&*self.db, id).await?;
        ensure_owner(identity, group.owner_id, "group")?;
        self.group_repr(identity, group).await
    }

    /// Apply the settable fields. Membership is reassigned first, so a
    /// power/brightness value in the same payload lands on the new member
    /// set. All writes share one transaction.
    pub async fn update_group(
        &self,
        identity: &Identity,
        payload: UpdateGroup,
    ) -> LightingResult<GroupRepr> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let mut group = fetch_group(&*self.db, id).await?;
        ensure_owner(identity, group.owner_id, "group")?;

        if let Some(location_id) = payload.location_id {
            let location = fetch_location(&*self.db, location_id).await?;
            ensure_owner(identity, location.owner_id, "location")?;
            group.location_id = location_id;
        }
        if let Some(bulb_ids) = &payload.bulb_ids {
            self.check_member_bulbs(identity, bulb_ids).await?;
        }
        if let Some(name) = payload.name {
            group.name = name;
        }
        if let Some(power) = payload.power {
            group.power = Some(power);
        }
        if let Some(brightness) = payload.brightness {
            group.brightness = Some(brightness);
        }

        let mut tx = self.db.begin().await?;
        sqlx::query(
            "UPDATE groups SET name = ?, location_id = ?, power = ?, brightness = ?
             WHERE id = ?",
        )
        .bind(&group.name)
        .bind(group.location_id)
        .bind(group.power)
        .bind(group.brightness)
        .bind(group.id)
        .execute(&mut *tx)
        .await?;

        if let Some(bulb_ids) = &payload.bulb_ids {
            assign_members(&mut tx, group.id, bulb_ids).await?;
        }
        if let Some(power) = payload.power {
            overwrite_member_power(&mut tx, group.id, power).await?;
        }
        if let Some(brightness) = payload.brightness {
            overwrite_member_brightness(&mut tx, group.id, brightness).await?;
        }
        tx.commit().await?;

        self.group_repr(identity, group).await
    }

    /// Delete a group. Member bulbs keep their now-dangling group_id; the
    /// convergence rule skips over it on their next power change.
    pub async fn delete_group(
        &self,
        identity: &Identity,
        payload: DeleteGroup,
    ) -> LightingResult<()> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let group = fetch_group(&*self.db, id).await?;
        ensure_owner(identity, group.owner_id, "group")?;

        sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(group.id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }

    pub async fn read_group_power(
        &self,
        identity: &Identity,
        id: Uuid,
    ) -> LightingResult<GroupState> {
        let group = fetch_group(&*self.db, id).await?;
        ensure_owner(identity, group.owner_id, "group")?;
        Ok(GroupState::of(&group))
    }

    /// Set a group's power and stamp it onto every member bulb.
    pub async fn set_group_power(
        &self,
        identity: &Identity,
        id: Uuid,
        payload: SetPower,
    ) -> LightingResult<GroupState> {
        let power = parse_power_state(payload.state)?;
        let mut group = fetch_group(&*self.db, id).await?;
        ensure_owner(identity, group.owner_id, "group")?;

        group.power = Some(power);

        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE groups SET power = ? WHERE id = ?")
            .bind(group.power)
            .bind(group.id)
            .execute(&mut *tx)
            .await?;
        overwrite_member_power(&mut tx, group.id, power).await?;
        tx.commit().await?;

        Ok(GroupState::of(&group))
    }
}

/// Reassign a group's member set: clear the back reference on departing
/// bulbs, set it on joining ones.
async fn assign_members(
    tx: &mut Transaction<'_, Sqlite>,
    group_id: Uuid,
    bulb_ids: &[Uuid],
) -> LightingResult<()> {
    let mut clear =
        QueryBuilder::<Sqlite>::new("UPDATE bulbs SET group_id = NULL WHERE group_id = ");
    clear.push_bind(group_id);
    if !bulb_ids.is_empty() {
        clear.push(" AND id NOT IN (");
        let mut ids = clear.separated(", ");
        for id in bulb_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    clear.build().execute(&mut **tx).await?;

    if !bulb_ids.is_empty() {
        let mut assign = QueryBuilder::<Sqlite>::new("UPDATE bulbs SET group_id = ");
        assign.push_bind(group_id);
        assign.push(" WHERE id IN (");
        let mut ids = assign.separated(", ");
        for id in bulb_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        assign.build().execute(&mut **tx).await?;
    }

    Ok(())
}

/// Hard overwrite of every member bulb's power with the group value.
async fn overwrite_member_power(
    tx: &mut Transaction<'_, Sqlite>,
    group_id: Uuid,
    power: bool,
) -> LightingResult<()> {
    sqlx::query("UPDATE bulbs SET power = ? WHERE group_id = ?")
        .bind(power)
        .bind(group_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Hard overwrite of every member bulb's brightness with the group value.
async fn overwrite_member_brightness(
    tx: &mut Transaction<'_, Sqlite>,
    group_id: Uuid,
    brightness: i64,
) -> LightingResult<()> {
    sqlx::query("UPDATE bulbs SET brightness = ? WHERE group_id = ?")
        .bind(brightness)
        .bind(group_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        bulbs::CreateBulb,
        test_utils::{seed_location, seed_user, setup_service},
    };

    async fn seed_bulb(
        service: &LightingService,
        identity: &Identity,
        location_id: Uuid,
        name: &str,
        power: Option<bool>,
    ) -> Uuid {
        service
            .create_bulb(
                identity,
                CreateBulb {
                    name: Some(name.into()),
                    bulb_type: Some("dimmable".into()),
                    location_id: Some(location_id),
                    power,
                    ..CreateBulb::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    fn new_group(location_id: Uuid, bulb_ids: Vec<Uuid>) -> CreateGroup {
        CreateGroup {
            name: Some("all".into()),
            location_id: Some(location_id),
            bulb_ids: Some(bulb_ids),
            ..CreateGroup::default()
        }
    }

    async fn bulb_state(service: &LightingService, id: Uuid) -> (Option<bool>, Option<i64>) {
        sqlx::query_as::<_, (Option<bool>, Option<i64>)>(
            "SELECT power, brightness FROM bulbs WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*service.db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_requires_name_location_and_members() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let mut payload = new_group(attic, vec![]);
        payload.name = None;
        let err = service.create_group(&amelia, payload).await.unwrap_err();
        assert!(matches!(err, LightingError::MissingField("name")));

        let mut payload = new_group(attic, vec![]);
        payload.location_id = None;
        let err = service.create_group(&amelia, payload).await.unwrap_err();
        assert!(matches!(err, LightingError::MissingField("location_id")));

        let mut payload = new_group(attic, vec![]);
        payload.bulb_ids = None;
        let err = service.create_group(&amelia, payload).await.unwrap_err();
        assert!(matches!(err, LightingError::MissingField("bulb_ids")));
    }

    #[tokio::test]
    async fn create_rejects_member_bulbs_the_caller_does_not_own() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let bert = seed_user(&service, "bert").await;
        let attic = seed_location(&service, &amelia, "attic").await;
        let garage = seed_location(&service, &bert, "garage").await;

        let mine = seed_bulb(&service, &amelia, attic, "mine", Some(false)).await;
        let theirs = seed_bulb(&service, &bert, garage, "theirs", Some(false)).await;

        let err = service
            .create_group(&amelia, new_group(attic, vec![mine, theirs]))
            .await
            .unwrap_err();
        assert!(matches!(err, LightingError::Unauthorized("bulb")));

        // Nothing was claimed by the failed create.
        let group_id: Option<Uuid> = sqlx::query_scalar("SELECT group_id FROM bulbs WHERE id = ?")
            .bind(mine)
            .fetch_one(&*service.db)
            .await
            .unwrap();
        assert_eq!(group_id, None);
    }

    #[tokio::test]
    async fn creation_stores_aggregate_state_without_touching_members() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;
        let bulb = seed_bulb(&service, &amelia, attic, "desk", Some(false)).await;

        let mut payload = new_group(attic, vec![bulb]);
        payload.power = Some(true);
        payload.brightness = Some(90);
        let group = service.create_group(&amelia, payload).await.unwrap();

        assert_eq!(group.power, Some(true));
        assert_eq!(group.bulbs, vec![bulb]);
        assert_eq!(bulb_state(&service, bulb).await, (Some(false), None));
    }

    #[tokio::test]
    async fn group_power_overwrites_every_member() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let b1 = seed_bulb(&service, &amelia, attic, "b1", Some(false)).await;
        let b2 = seed_bulb(&service, &amelia, attic, "b2", Some(true)).await;
        let b3 = seed_bulb(&service, &amelia, attic, "b3", None).await;
        let group = service
            .create_group(&amelia, new_group(attic, vec![b1, b2, b3]))
            .await
            .unwrap();

        let state = service
            .set_group_power(&amelia, group.id, SetPower { state: Some(1) })
            .await
            .unwrap();
        assert_eq!(state.power, Some(true));
        assert_eq!(state.state, "On");
        for bulb in [b1, b2, b3] {
            assert_eq!(bulb_state(&service, bulb).await.0, Some(true));
        }

        // The generic update path propagates the same way.
        service
            .update_group(
                &amelia,
                UpdateGroup {
                    id: Some(group.id),
                    power: Some(false),
                    ..UpdateGroup::default()
                },
            )
            .await
            .unwrap();
        for bulb in [b1, b2, b3] {
            assert_eq!(bulb_state(&service, bulb).await.0, Some(false));
        }
    }

    #[tokio::test]
    async fn group_brightness_overwrites_every_member() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let b1 = seed_bulb(&service, &amelia, attic, "b1", Some(false)).await;
        let b2 = seed_bulb(&service, &amelia, attic, "b2", Some(false)).await;
        let group = service
            .create_group(&amelia, new_group(attic, vec![b1, b2]))
            .await
            .unwrap();

        let repr = service
            .update_group(
                &amelia,
                UpdateGroup {
                    id: Some(group.id),
                    brightness: Some(55),
                    ..UpdateGroup::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(repr.brightness, Some(55));
        assert_eq!(bulb_state(&service, b1).await.1, Some(55));
        assert_eq!(bulb_state(&service, b2).await.1, Some(55));
    }

    #[tokio::test]
    async fn member_reassignment_updates_both_sides() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let b1 = seed_bulb(&service, &amelia, attic, "b1", Some(false)).await;
        let b2 = seed_bulb(&service, &amelia, attic, "b2", Some(false)).await;
        let b3 = seed_bulb(&service, &amelia, attic, "b3", Some(false)).await;
        let group = service
            .create_group(&amelia, new_group(attic, vec![b1, b2]))
            .await
            .unwrap();

        let repr = service
            .update_group(
                &amelia,
                UpdateGroup {
                    id: Some(group.id),
                    bulb_ids: Some(vec![b2, b3]),
                    ..UpdateGroup::default()
                },
            )
            .await
            .unwrap();

        let mut members = repr.bulbs.clone();
        members.sort();
        let mut expected = vec![b2, b3];
        expected.sort();
        assert_eq!(members, expected);

        let b1_group: Option<Uuid> = sqlx::query_scalar("SELECT group_id FROM bulbs WHERE id = ?")
            .bind(b1)
            .fetch_one(&*service.db)
            .await
            .unwrap();
        assert_eq!(b1_group, None);
    }

    #[tokio::test]
    async fn reassignment_and_power_in_one_payload_hit_the_new_members() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let old = seed_bulb(&service, &amelia, attic, "old", Some(false)).await;
        let new = seed_bulb(&service, &amelia, attic, "new", Some(false)).await;
        let group = service
            .create_group(&amelia, new_group(attic, vec![old]))
            .await
            .unwrap();

        service
            .update_group(
                &amelia,
                UpdateGroup {
                    id: Some(group.id),
                    bulb_ids: Some(vec![new]),
                    power: Some(true),
                    ..UpdateGroup::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(bulb_state(&service, new).await.0, Some(true));
        assert_eq!(bulb_state(&service, old).await.0, Some(false));
    }

    #[tokio::test]
    async fn failed_member_overwrite_rolls_back_the_group_write() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let bulb = seed_bulb(&service, &amelia, attic, "desk", Some(false)).await;
        let mut payload = new_group(attic, vec![bulb]);
        payload.power = Some(false);
        let group = service.create_group(&amelia, payload).await.unwrap();

        // Make the member-side write fail so the transaction cannot commit.
        sqlx::query(
            "CREATE TRIGGER bulbs_power_frozen BEFORE UPDATE OF power ON bulbs
             BEGIN SELECT RAISE(ABORT, 'bulb power frozen'); END",
        )
        .execute(&*service.db)
        .await
        .unwrap();

        let err = service
            .set_group_power(&amelia, group.id, SetPower { state: Some(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, LightingError::Sqlx(_)));

        // The group write rolled back together with the push-down; no
        // partial state is visible.
        let power: Option<bool> = sqlx::query_scalar("SELECT power FROM groups WHERE id = ?")
            .bind(group.id)
            .fetch_one(&*service.db)
            .await
            .unwrap();
        assert_eq!(power, Some(false));
        assert_eq!(bulb_state(&service, bulb).await.0, Some(false));
    }

    #[tokio::test]
    async fn delete_leaves_members_with_a_dangling_reference() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let bulb = seed_bulb(&service, &amelia, attic, "desk", Some(false)).await;
        let group = service
            .create_group(&amelia, new_group(attic, vec![bulb]))
            .await
            .unwrap();

        service
            .delete_group(&amelia, DeleteGroup { id: Some(group.id) })
            .await
            .unwrap();

        let stale: Option<Uuid> = sqlx::query_scalar("SELECT group_id FROM bulbs WHERE id = ?")
            .bind(bulb)
            .fetch_one(&*service.db)
            .await
            .unwrap();
        assert_eq!(stale, Some(group.id));
    }

    #[tokio::test]
    async fn unset_power_reads_as_error_state() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let attic = seed_location(&service, &amelia, "attic").await;

        let group = service
            .create_group(&amelia, new_group(attic, vec![]))
            .await
            .unwrap();

        let state = service.read_group_power(&amelia, group.id).await.unwrap();
        assert_eq!(state.power, None);
        assert_eq!(state.state, "Error");

        let state = service
            .set_group_power(&amelia, group.id, SetPower { state: Some(0) })
            .await
            .unwrap();
        assert_eq!(state.state, "Off");
    }
}
