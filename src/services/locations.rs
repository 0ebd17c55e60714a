//! src/services/locations.rs
//!
//! Locations are the flat containers bulbs and groups point at. Deleting
//! one does not cascade; contained rows keep their dangling reference and
//! surface it at read time.

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::Identity,
    models::location::{Location, LocationRepr},
    services::lighting_service::{
        LightingError, LightingResult, LightingService, ensure_owner, fetch_location,
    },
};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateLocation {
    pub name: Option<String>,
}

/// Settable location fields. Anything else in the payload is ignored.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateLocation {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DeleteLocation {
    pub id: Option<Uuid>,
}

impl LightingService {
    fn location_repr(&self, identity: &Identity, location: Location) -> LocationRepr {
        LocationRepr {
            id: location.id,
            name: location.name,
            owner: identity.user_ref(),
        }
    }

    pub async fn create_location(
        &self,
        identity: &Identity,
        payload: CreateLocation,
    ) -> LightingResult<LocationRepr> {
        let name = payload.name.ok_or(LightingError::MissingField("name"))?;

        let location = Location {
            id: Uuid::new_v4(),
            name,
            owner_id: identity.id,
        };

        sqlx::query("INSERT INTO locations (id, name, owner_id) VALUES (?, ?, ?)")
            .bind(location.id)
            .bind(&location.name)
            .bind(location.owner_id)
            .execute(&*self.db)
            .await?;

        Ok(self.location_repr(identity, location))
    }

    /// List the caller's own locations.
    pub async fn list_locations(&self, identity: &Identity) -> LightingResult<Vec<LocationRepr>> {
        let rows = sqlx::query_as::<_, Location>(
            "SELECT id, name, owner_id FROM locations WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(identity.id)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|location| self.location_repr(identity, location))
            .collect())
    }

    pub async fn read_location(
        &self,
        identity: &Identity,
        id: Uuid,
    ) -> LightingResult<LocationRepr> {
        let location = fetch_location(&*self.db, id).await?;
        ensure_owner(identity, location.owner_id, "location")?;
        Ok(self.location_repr(identity, location))
    }

    pub async fn update_location(
        &self,
        identity: &Identity,
        payload: UpdateLocation,
    ) -> LightingResult<LocationRepr> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let mut location = fetch_location(&*self.db, id).await?;
        ensure_owner(identity, location.owner_id, "location")?;

        if let Some(name) = payload.name {
            location.name = name;
        }

        sqlx::query("UPDATE locations SET name = ? WHERE id = ?")
            .bind(&location.name)
            .bind(location.id)
            .execute(&*self.db)
            .await?;

        Ok(self.location_repr(identity, location))
    }

    /// Delete a location. Bulbs and groups inside it are left in place with
    /// their now-dangling location_id.
    pub async fn delete_location(
        &self,
        identity: &Identity,
        payload: DeleteLocation,
    ) -> LightingResult<()> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let location = fetch_location(&*self.db, id).await?;
        ensure_owner(identity, location.owner_id, "location")?;

        sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(location.id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{seed_user, setup_service};

    #[tokio::test]
    async fn create_requires_a_name() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;

        let err = service
            .create_location(&amelia, CreateLocation::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LightingError::MissingField("name")));
    }

    #[tokio::test]
    async fn crud_round_trip_stays_owner_scoped() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let bert = seed_user(&service, "bert").await;

        let created = service
            .create_location(
                &amelia,
                CreateLocation {
                    name: Some("attic".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.owner.id, amelia.id);

        let read = service.read_location(&amelia, created.id).await.unwrap();
        assert_eq!(read.name, "attic");

        // Another identity sees neither the row nor the list entry.
        let err = service.read_location(&bert, created.id).await.unwrap_err();
        assert!(matches!(err, LightingError::Unauthorized("location")));
        assert!(service.list_locations(&bert).await.unwrap().is_empty());

        let renamed = service
            .update_location(
                &amelia,
                UpdateLocation {
                    id: Some(created.id),
                    name: Some("basement".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "basement");

        service
            .delete_location(
                &amelia,
                DeleteLocation {
                    id: Some(created.id),
                },
            )
            .await
            .unwrap();
        let err = service.read_location(&amelia, created.id).await.unwrap_err();
        assert!(matches!(
            err,
            LightingError::NotFound {
                entity: "location",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn non_owner_mutations_are_rejected() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let bert = seed_user(&service, "bert").await;

        let created = service
            .create_location(
                &amelia,
                CreateLocation {
                    name: Some("attic".into()),
                },
            )
            .await
            .unwrap();

        let err = service
            .update_location(
                &bert,
                UpdateLocation {
                    id: Some(created.id),
                    name: Some("mine now".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LightingError::Unauthorized("location")));

        let err = service
            .delete_location(
                &bert,
                DeleteLocation {
                    id: Some(created.id),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LightingError::Unauthorized("location")));

        // The failed attempts left the row untouched.
        let read = service.read_location(&amelia, created.id).await.unwrap();
        assert_eq!(read.name, "attic");
    }

    #[tokio::test]
    async fn list_returns_only_the_callers_locations() {
        let service = setup_service().await;
        let amelia = seed_user(&service, "amelia").await;
        let bert = seed_user(&service, "bert").await;

        for name in ["attic", "basement"] {
            service
                .create_location(
                    &amelia,
                    CreateLocation {
                        name: Some(name.into()),
                    },
                )
                .await
                .unwrap();
        }
        service
            .create_location(
                &bert,
                CreateLocation {
                    name: Some("garage".into()),
                },
            )
            .await
            .unwrap();

        let names: Vec<String> = service
            .list_locations(&amelia)
            .await
            .unwrap()
            .into_iter()
            .map(|repr| repr.name)
            .collect();
        assert_eq!(names, ["attic", "basement"]);
    }
}
