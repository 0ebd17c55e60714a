//! src/services/users.rs
//!
//! Account lifecycle: registration mints the api key and confirmation
//! token and queues the confirmation mail; confirmation consumes the
//! token; every other operation is self-scoped (a user may read, update
//! and delete only themself).

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{Identity, hash_password},
    models::user::{User, UserRepr},
    services::lighting_service::{
        LightingError, LightingResult, LightingService, ensure_owner, fetch_user,
        is_unique_violation, unique_violation_field,
    },
};

/// Registration payload. Fields are optional at the serde layer so a missing
/// one surfaces as a MissingField error instead of a deserialization failure.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RegisterUser {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ConfirmUser {
    pub token: Option<String>,
}

/// Settable user fields. Anything else in the payload is ignored.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateUser {
    pub id: Option<Uuid>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub last_location: Option<Uuid>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DeleteUser {
    pub id: Option<Uuid>,
}

impl LightingService {
    /// Register a new account: hash the password, mint the api key and the
    /// confirmation token, persist, and queue the confirmation mail.
    pub async fn register_user(&self, payload: RegisterUser) -> LightingResult<UserRepr> {
        let nickname = payload
            .nickname
            .ok_or(LightingError::MissingField("nickname"))?;
        let email = payload.email.ok_or(LightingError::MissingField("email"))?;
        let password = payload
            .password
            .ok_or(LightingError::MissingField("password"))?;

        let user = User {
            id: Uuid::new_v4(),
            nickname,
            email,
            password_hash: hash_password(&password)?,
            api_key: Uuid::new_v4().simple().to_string(),
            confirmed: false,
            confirm_token: Some(Uuid::new_v4().simple().to_string()),
            last_location: None,
            created_at: Utc::now(),
            confirmed_at: None,
        };

        match sqlx::query(
            "INSERT INTO users (id, nickname, email, password_hash, api_key, confirmed,
                                confirm_token, last_location, created_at, confirmed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.api_key)
        .bind(user.confirmed)
        .bind(user.confirm_token.as_deref())
        .bind(user.last_location)
        .bind(user.created_at)
        .bind(user.confirmed_at)
        .execute(&*self.db)
        .await
        {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(LightingError::AlreadyTaken {
                    field: unique_violation_field(&err),
                });
            }
            Err(err) => return Err(LightingError::Sqlx(err)),
        }

        if let Some(token) = &user.confirm_token {
            self.mailer.send_confirmation(&user.email, token);
        }

        Ok(user.into())
    }

    /// Consume a confirmation token, marking the account confirmed. Tokens
    /// are single-use.
    pub async fn confirm_user(&self, payload: ConfirmUser) -> LightingResult<UserRepr> {
        let token = payload.token.ok_or(LightingError::MissingField("token"))?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, nickname, email, password_hash, api_key, confirmed,
                    confirm_token, last_location, created_at, confirmed_at
             FROM users WHERE confirm_token = ?",
        )
        .bind(&token)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| LightingError::InvalidValue("unknown confirmation token".into()))?;

        sqlx::query(
            "UPDATE users SET confirmed = 1, confirm_token = NULL, confirmed_at = ?
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(user.id)
        .execute(&*self.db)
        .await?;

        Ok(fetch_user(&*self.db, user.id).await?.into())
    }

    /// Resolve a bearer token to the acting identity. An unknown token is a
    /// plain client error, indistinguishable from a malformed one.
    pub async fn identity_for_token(&self, token: &str) -> LightingResult<Identity> {
        sqlx::query_as::<_, Identity>("SELECT id, nickname, email FROM users WHERE api_key = ?")
            .bind(token)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| LightingError::InvalidValue("invalid API token".into()))
    }

    /// Read an account. Any id other than the caller's own is rejected even
    /// when the row exists.
    pub async fn read_user(&self, identity: &Identity, id: Uuid) -> LightingResult<UserRepr> {
        let user = fetch_user(&*self.db, id).await?;
        ensure_owner(identity, user.id, "user")?;
        Ok(user.into())
    }

    /// Apply the settable fields (nickname, email, password, last_location)
    /// to the caller's own account. A supplied password is re-hashed.
    pub async fn update_user(
        &self,
        identity: &Identity,
        payload: UpdateUser,
    ) -> LightingResult<UserRepr> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let mut user = fetch_user(&*self.db, id).await?;
        ensure_owner(identity, user.id, "user")?;

        if let Some(nickname) = payload.nickname {
            user.nickname = nickname;
        }
        if let Some(email) = payload.email {
            user.email = email;
        }
        if let Some(password) = payload.password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(last_location) = payload.last_location {
            user.last_location = Some(last_location);
        }

        match sqlx::query(
            "UPDATE users SET nickname = ?, email = ?, password_hash = ?, last_location = ?
             WHERE id = ?",
        )
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.last_location)
        .bind(user.id)
        .execute(&*self.db)
        .await
        {
            Ok(_) => Ok(user.into()),
            Err(err) if is_unique_violation(&err) => Err(LightingError::AlreadyTaken {
                field: unique_violation_field(&err),
            }),
            Err(err) => Err(LightingError::Sqlx(err)),
        }
    }

    /// Delete the caller's own account.
    pub async fn delete_user(&self, identity: &Identity, payload: DeleteUser) -> LightingResult<()> {
        let id = payload.id.ok_or(LightingError::MissingField("id"))?;
        let user = fetch_user(&*self.db, id).await?;
        ensure_owner(identity, user.id, "user")?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}
