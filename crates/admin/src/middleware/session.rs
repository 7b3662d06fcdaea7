//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! SameSite=Strict cookies and a 24 hour inactivity expiry.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "emporium_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Errors configuring the session store.
#[derive(Debug, thiserror::Error)]
#[error("invalid session store name: {0}")]
pub struct SessionStoreError(String);

/// Create the `PostgreSQL` session store on `admin.session`.
///
/// The table is created by the migrations, not by the store.
///
/// # Errors
///
/// Returns `SessionStoreError` if the schema or table name is rejected.
pub fn create_session_store(pool: &PgPool) -> Result<PostgresStore, SessionStoreError> {
    PostgresStore::new(pool.clone())
        .with_schema_name("admin")
        .map_err(|e| SessionStoreError(e.to_string()))?
        .with_table_name("session")
        .map_err(|e| SessionStoreError(e.to_string()))
}

/// Create the session layer with `PostgreSQL` store.
///
/// # Errors
///
/// Returns `SessionStoreError` if the store cannot be configured.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionStoreError> {
    let store = create_session_store(pool)?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/"))
}
