use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::lighting_service::LightingError;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Map the service taxonomy onto the wire contract. The API does not
/// distinguish 401/403 from generic validation errors: every permission
/// failure flattens to 400 alongside missing fields, invalid values and
/// duplicates; only a missing row is a 404. Storage and hashing failures
/// become an opaque 500 with the detail kept in the logs.
impl From<LightingError> for AppError {
    fn from(err: LightingError) -> Self {
        let status = match err {
            LightingError::NotFound { .. } => StatusCode::NOT_FOUND,
            LightingError::MissingField(_)
            | LightingError::Unauthorized(_)
            | LightingError::InvalidValue(_)
            | LightingError::AlreadyTaken { .. } => StatusCode::BAD_REQUEST,
            LightingError::Sqlx(_) | LightingError::PasswordHash(_) => {
                tracing::error!("internal failure serving request: {err}");
                return AppError::internal("internal storage error");
            }
        };
        AppError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn ownership_failures_flatten_to_bad_request() {
        let err = AppError::from(LightingError::Unauthorized("bulb"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("bulb"));
    }

    #[test]
    fn missing_rows_map_to_not_found() {
        let err = AppError::from(LightingError::NotFound {
            entity: "group",
            id: Uuid::nil(),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_failures_map_to_bad_request() {
        for err in [
            LightingError::MissingField("name"),
            LightingError::InvalidValue("power state must be 0 or 1".into()),
            LightingError::AlreadyTaken { field: "nickname" },
        ] {
            assert_eq!(AppError::from(err).status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn storage_failures_map_to_opaque_internal_error() {
        let err = AppError::from(LightingError::Sqlx(sqlx::Error::PoolClosed));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal storage error");
    }
}
