//! CLI subcommands.

pub mod admin;
pub mod export;
pub mod import;
pub mod media;
pub mod migrate;

use sqlx::PgPool;

use emporium_admin::config::{ConfigError, get_database_url};

/// Errors shared by commands that need the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the admin database from `ADMIN_DATABASE_URL` / `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConnectError` if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let database_url = get_database_url("ADMIN_DATABASE_URL")?;
    tracing::info!("Connecting to admin database...");
    Ok(emporium_admin::db::create_pool(&database_url).await?)
}
