//! Fixture import.
//!
//! # Usage
//!
//! ```bash
//! # Every table with a fixture file in FIXTURES_DIR
//! em-cli import
//!
//! # Only coupons, from another directory
//! em-cli import --source-dir ./seed coupon
//! ```

use std::path::PathBuf;

use thiserror::Error;

use emporium_admin::config::PathsConfig;
use emporium_admin::db::settings::{self, LAST_IMPORT};
use emporium_admin::db::tables::UnknownTable;
use emporium_admin::services::import::import_tables;

use super::export::select_tables;
use super::{ConnectError, connect};

/// Errors that can occur while importing.
#[derive(Debug, Error)]
pub enum ImportCommandError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    UnknownTable(#[from] UnknownTable),

    #[error("{0} table(s) failed to import")]
    TablesFailed(usize),
}

/// Import fixture files and log a per-table summary.
///
/// Row failures are reported but do not fail the command. A table that
/// cannot be read or finished fails the command once every other table has
/// run and the report is recorded.
///
/// # Errors
///
/// Returns `ImportCommandError` for a bad table name, a connection failure,
/// or any failed table.
pub async fn run(source_dir: Option<PathBuf>, tables: &[String]) -> Result<(), ImportCommandError> {
    let dir = source_dir.unwrap_or_else(|| PathsConfig::from_env().fixtures_dir);
    let tables = select_tables(tables)?;
    let pool = connect().await?;

    tracing::info!("Importing fixtures from {}", dir.display());
    let report = import_tables(&pool, &dir, &tables).await;

    for table in &report.tables {
        tracing::info!(
            "{}: {} row(s), {} inserted, {} updated, {} failed",
            table.table,
            table.rows,
            table.inserted,
            table.updated,
            table.failed
        );
        for error in &table.errors {
            tracing::warn!("  {}: {}", table.table, error);
        }
    }
    for table in &report.skipped {
        tracing::info!("{table}: no fixture file, skipped");
    }
    for failure in &report.failed_tables {
        tracing::error!("{}: {}", failure.table, failure.error);
    }
    tracing::info!(
        "Import complete: {} inserted, {} updated, {} failed",
        report.inserted,
        report.updated,
        report.failed
    );

    if let Err(e) = settings::set_typed(&pool, LAST_IMPORT, &report).await {
        tracing::warn!("Failed to record import report: {e}");
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(ImportCommandError::TablesFailed(report.failed_tables.len()))
    }
}
