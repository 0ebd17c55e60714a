//! src/services/scenes.rs
//!
//! Scenes are named snapshots: each one records a brightness/color override
//! per bulb at create or update time. The snapshot is never re-synced with
//! the live bulbs, and nothing here applies a scene to the bulbs. Snapshot
//! rows are owned by their scene and replaced or removed with it.

use serde::Deserialize;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::{
    auth::Identity,
    models::scene::{Scene, SceneBulb, SceneRepr},
    services::lighting_service::{
        LightingError, LightingResult, LightingService, ensure_owner, fetch_bulb, fetch_scene,
        is_unique_violation,
    },
};

/// One snapshot entry in a scene payload; the bulb id is required.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SceneBulbEntry {
    pub id: Option<Uuid>,
    pub brightness: Option<i64>,
    pub color: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateScene {
    pub name: Option<String>,
    pub bulbs: Option<Vec<SceneBulbEntry>>,
}

/// Settable scene fields. A present bulbs list replaces the whole snapshot.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateScene {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub bulbs: Option<Vec<SceneBulbEntry>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DeleteScene {
    pub id: Option<Uuid>,
}

impl LightingService {
    async fn scene_repr(&self, identity: &Identity, scene: Scene) -> LightingResult<SceneRepr> {
        let entries = sqlx::query_as::<_, SceneBulb>(
            "SELECT scene_id, bulb_id, brightness, color
             FROM scene_bulbs WHERE scene_id = ? ORDER BY bulb_id",
        )
        .bind(scene.id)
        .fetch_all(&*self.db)
        .await?;

        Ok(SceneRepr {
            id: scene.id,
            name: scene.name,
            owner: identity.user_ref(),
            bulbs: entries.into_iter().map(Into::into).collect(),
        })
    }

    /// Turn payload entries into snapshot rows, checking that every
    /// referenced bulb exists and belongs to the caller.
    async fn resolve_snapshot(
        &self,
        identity: &Identity,
        scene_id: Uuid,
        entries: Vec<SceneBulbEntry>,
    ) -> LightingResult<Vec<SceneBulb>> {
        let mut resolved = Vec::with_capacity(entries.len());
        for entry in entries {
            let bulb_id = entry.id.ok_or(LightingError::MissingField("bulbs[].id"))?;
            let bulb = fetch_bulb(&*self.db, bulb_id).await?;
            ensure_owner(identity, bulb.owner_id, "bulb")?;
            resolved.push(SceneBulb {
                scene_id,
                bulb_id,
                brightness: entry.brightness,
                color: entry.color,
            });
        }
        Ok(resolved)
    }

    pub async fn create_scene(
        &self,
        identity: &Identity,
        payload: CreateScene,
    ) -> LightingResult<SceneRepr> {
        let name = payload.name.ok_or(LightingError::MissingField("name"))?;
        let entries = payload.bulbs.ok_or(LightingError::MissingField("bulbs"))?;

        let scene = Scene {
            id: Uuid::new_v4(),
            name,
            owner_id: identity.id,
        };
        let snapshot = self.resolve_snapshot(identity, scene.id, entries).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("INSERT INTO scenes (id, name, owner_id) VALUES (?, ?, ?)")
            .bind(scene.id)
            .bind(&scene.name)
            .bind(scene.owner_id)
            .execute(&mut *tx)
            .await?;
        insert_snapshot(&mut tx, &snapshot).await?;
        tx.commit().await?;

        self.scene_repr(identity, scene).await
    }

    /// List the caller's own scenes.
    pub async fn list_scenes(&self, identity: &Identity) -> LightingResult<Vec<SceneRepr>> {
        let rows = sqlx::query_as::<_, Scene>(
            "SELECT id, name, owner_id FROM scenes WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(identity.id)
        .fetch_all(&*self.db)
        .await?;

        let mut reprs = Vec::with_capacity(rows.len());
        for scene in rows {
            reprs.push(self.scene_repr(identity, scene).await?);
        }
        Ok(reprs)
    }

    pub async fn read_scene(&self, identity: &Identity, id: Uuid) -> LightingResult<SceneRepr> {
        let scene = fetch_scene(&*self.db, id).await?;
        ensure_owner(identity, scene.owner_id, "scene")?;
        self.scene_repr(identity, scene).await
    }

    /// Apply the settable fields; a present bulbs list replaces the stored
    /// snapshot wholesale.
    pub async fn update_scene(
        &self,
        identity: &Identity,
        payload: UpdateScene,
    ) -> LightingResult<SceneRepr> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let mut scene = fetch_scene(&*self.db, id).await?;
        ensure_owner(identity, scene.owner_id, "scene")?;

        if let Some(name) = payload.name {
            scene.name = name;
        }
        let snapshot = match payload.bulbs {
            Some(entries) => Some(self.resolve_snapshot(identity, scene.id, entries).await?),
            None => None,
        };

        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE scenes SET name = ? WHERE id = ?")
            .bind(&scene.name)
            .bind(scene.id)
            .execute(&mut *tx)
            .await?;
        if let Some(snapshot) = &snapshot {
            sqlx::query("DELETE FROM scene_bulbs WHERE scene_id = ?")
                .bind(scene.id)
                .execute(&mut *tx)
                .await?;
            insert_snapshot(&mut tx, snapshot).await?;
        }
        tx.commit().await?;

        self.scene_repr(identity, scene).await
    }

    /// Delete a scene together with its snapshot rows.
    pub async fn delete_scene(
        &self,
        identity: &Identity,
        payload: DeleteScene,
    ) -> LightingResult<()> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let scene = fetch_scene(&*self.db, id).await?;
        ensure_owner(identity, scene.owner_id, "scene")?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM scene_bulbs WHERE scene_id = ?")
            .bind(scene.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM scenes WHERE id = ?")
            .bind(scene.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }
}

/// Insert snapshot rows. A bulb listed twice trips the (scene_id, bulb_id)
/// key and is reported as a client error.
async fn insert_snapshot(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &[SceneBulb],
) -> LightingResult<()> {
    for entry in snapshot {
        sqlx::query(
            "INSERT INTO scene_bulbs (scene_id, bulb_id, brightness, color)
             VALUES (?, ?, ?, ?)",
        )
        .bind(entry.scene_id)
        .bind(entry.bulb_id)
        .bind(entry.brightness)
        .bind(entry.color.as_deref())
        .execute(&mut **tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                LightingError::InvalidValue("duplicate bulb in scene".into())
            } else {
                LightingError::Sqlx(err)
            }
        })?;
    }
    Ok(())
}
