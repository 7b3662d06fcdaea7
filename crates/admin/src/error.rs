//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use emporium_core::SlugError;

use crate::db::RepositoryError;
use crate::db::settings::SettingsError;
use crate::db::tables::UnknownTable;
use crate::services::{AuthError, ExportError, ImportError, MediaError};
use crate::storage::StorageError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Blob storage request failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with stored data.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Shorthand for a 404 naming the missing entity.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Storage(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Storage(_) => "Storage service error".to_string(),
            Self::Conflict(msg) => msg.clone(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Invalid(msg) => Self::BadRequest(msg),
            other => Self::Database(other),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<SlugError> for AppError {
    fn from(err: SlugError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<UnknownTable> for AppError {
    fn from(err: UnknownTable) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            e if e.is_client_error() => Self::BadRequest(e.to_string()),
            MediaError::NotFound(key) => Self::NotFound(key),
            MediaError::Storage(e) => Self::Storage(e),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            e if e.is_client_error() => Self::BadRequest(e.to_string()),
            ExportError::Repository(e) => e.into(),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            e if e.is_client_error() => Self::BadRequest(e.to_string()),
            ImportError::Repository(e) => e.into(),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => {
                Self::BadRequest(err.to_string())
            }
            AuthError::UserAlreadyExists => Self::Conflict(err.to_string()),
            AuthError::Repository(e) => e.into(),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: i32, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        let conflict: AppError =
            RepositoryError::Conflict("Cannot delete product: it is referenced by 2 order(s)".into())
                .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            conflict.to_string(),
            "Cannot delete product: it is referenced by 2 order(s)"
        );

        let missing: AppError = RepositoryError::NotFound.into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let invalid: AppError = RepositoryError::Invalid("too much".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let corrupt: AppError = RepositoryError::DataCorruption("x".into()).into();
        assert_eq!(corrupt.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_service_error_mapping() {
        let err: AppError = MediaError::InvalidKey("../x".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = MediaError::NotFound("a.png".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = ExportError::NoTables.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = UnknownTable("users".into()).into();
        assert_eq!(err.to_string(), "Bad request: unknown table 'users'");

        let err: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: AppError = StorageError::NotFound("a.png".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
