//! Shared fixtures for the service test suites: an in-memory SQLite pool
//! with the schema applied, plus direct-insert seed helpers.

use std::{str::FromStr, sync::Arc};

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

use crate::{auth::Identity, mailer::Mailer, services::lighting_service::LightingService};

/// A LightingService over a fresh in-memory database. The pool is capped at
/// one connection: every in-memory connection is its own empty database, and
/// a pool of one also enforces the service's transaction discipline (no pool
/// queries while a transaction is open). Foreign keys are off, matching the
/// server's connect options — dangling references are a representable state.
pub(crate) async fn setup_service() -> LightingService {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("parse sqlite url")
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("open in-memory sqlite");

    for statement in include_str!("../../migrations/0001_init.sql").split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("apply schema");
    }

    LightingService::new(Arc::new(pool), Mailer::default())
}

/// Insert a confirmed user directly and return the acting identity.
pub(crate) async fn seed_user(service: &LightingService, nickname: &str) -> Identity {
    let id = Uuid::new_v4();
    let email = format!("{nickname}@example.com");
    sqlx::query(
        "INSERT INTO users (id, nickname, email, password_hash, api_key, confirmed, created_at)
         VALUES (?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(id)
    .bind(nickname)
    .bind(&email)
    .bind("$argon2id$v=19$seeded")
    .bind(Uuid::new_v4().simple().to_string())
    .bind(Utc::now())
    .execute(&*service.db)
    .await
    .expect("seed user");

    Identity {
        id,
        nickname: nickname.to_string(),
        email,
    }
}

/// Insert a location owned by `owner` and return its id.
pub(crate) async fn seed_location(service: &LightingService, owner: &Identity, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO locations (id, name, owner_id) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(owner.id)
        .execute(&*service.db)
        .await
        .expect("seed location");
    id
}
