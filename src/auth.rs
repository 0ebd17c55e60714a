//! Identity resolution and password hashing.
//!
//! Page-style sessions are out of scope; the API authenticates every
//! request with a bearer api_key minted at registration. The extractor
//! resolves the token to an [`Identity`], which handlers pass explicitly
//! into every service operation — there is no ambient "current user".

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::user::UserRef,
    services::lighting_service::{LightingError, LightingResult, LightingService},
};

/// The authenticated actor behind a request.
#[derive(Clone, FromRow, Debug)]
pub struct Identity {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
}

impl Identity {
    /// Owner reference for representations. Valid because the ownership
    /// gate has already matched the resource's owner_id to this identity.
    pub(crate) fn user_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            nickname: self.nickname.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    LightingService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let service = LightingService::from_ref(state);
        let token = bearer_token(parts).ok_or_else(|| {
            // Credential failures flatten to 400 like every other client error.
            AppError::new(StatusCode::BAD_REQUEST, "missing API token")
        })?;
        Ok(service.identity_for_token(&token).await?)
    }
}

/// Pull the token out of the Authorization header. The `Bearer` prefix is
/// optional; a bare key is accepted as well.
fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Hash a password for storage (argon2id with a fresh salt). The inverse
/// check lives with the session layer, which is not part of this service.
pub fn hash_password(plain: &str) -> LightingResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| LightingError::PasswordHash(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_never_echoes_the_password() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("hunter2"));
    }

    #[test]
    fn bearer_prefix_is_optional() {
        let mut request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts).as_deref(), Some("abc123"));

        request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "abc123")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn blank_authorization_header_is_rejected() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer ")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
