//! Settings database operations.
//!
//! Global key/value settings stored as JSONB. Used to remember the outcome
//! of the last media sync and data import.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// Key under which the last media sync summary is stored.
pub const LAST_MEDIA_SYNC: &str = "media.last_sync";

/// Key under which the last import report is stored.
pub const LAST_IMPORT: &str = "data_manager.last_import";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Get a setting value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<JsonValue>, SettingsError> {
    let result = sqlx::query_scalar::<_, JsonValue>("SELECT value FROM admin.settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(result)
}

/// Set a setting value, replacing any previous one.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn set_setting(pool: &PgPool, key: &str, value: &JsonValue) -> Result<(), SettingsError> {
    sqlx::query(
        r"
        INSERT INTO admin.settings (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
        ",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Serialize and store a typed value.
///
/// # Errors
///
/// Returns an error if serialization or the database query fails.
pub async fn set_typed<T: serde::Serialize + Sync>(
    pool: &PgPool,
    key: &str,
    value: &T,
) -> Result<(), SettingsError> {
    let json = serde_json::to_value(value)?;
    set_setting(pool, key, &json).await
}
