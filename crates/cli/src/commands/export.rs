//! Table export to disk.
//!
//! # Usage
//!
//! ```bash
//! # Every table, one JSON file each
//! em-cli export
//!
//! # Two tables in one XML file
//! em-cli export --format xml --combined brand product
//! ```

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use emporium_admin::db::tables::{Table, UnknownTable};
use emporium_admin::services::export::{load_tables, render_combined, render_table};
use emporium_admin::services::{ExportError, ExportFile, ExportFormat};

use super::{ConnectError, connect};

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportCommandError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    UnknownTable(#[from] UnknownTable),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tables named on the command line, or every table when none are.
///
/// # Errors
///
/// Returns `UnknownTable` for a name that is not managed.
pub fn select_tables(names: &[String]) -> Result<Vec<Table>, UnknownTable> {
    if names.is_empty() {
        return Ok(Table::ALL.to_vec());
    }
    Table::parse_list(&names.join(","))
}

/// Write rendered files into `out_dir`, creating it if needed.
///
/// # Errors
///
/// Returns `ExportCommandError::Write` on the first filesystem failure.
pub async fn write_files(
    out_dir: &Path,
    files: &[ExportFile],
) -> Result<Vec<PathBuf>, ExportCommandError> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|source| ExportCommandError::Write {
            path: out_dir.to_owned(),
            source,
        })?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = out_dir.join(&file.file_name);
        tokio::fs::write(&path, &file.body)
            .await
            .map_err(|source| ExportCommandError::Write {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    Ok(written)
}

/// Export tables to files.
///
/// # Errors
///
/// Returns `ExportCommandError` for a bad format or table name, a database
/// failure, or a write failure.
pub async fn run(
    format: &str,
    out_dir: &Path,
    combined: bool,
    tables: &[String],
) -> Result<(), ExportCommandError> {
    let format: ExportFormat = format.parse()?;
    let tables = select_tables(tables)?;
    let pool = connect().await?;

    let data = load_tables(&pool, &tables).await?;
    let now = Utc::now();
    let files = if combined {
        vec![render_combined(format, &data, now)?]
    } else {
        data.iter()
            .map(|d| render_table(format, d, now))
            .collect::<Result<Vec<_>, _>>()?
    };

    for path in write_files(out_dir, &files).await? {
        tracing::info!("Wrote {}", path.display());
    }
    tracing::info!("Exported {} table(s) as {}", tables.len(), format);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_select_tables() {
        assert_eq!(select_tables(&[]).unwrap().len(), Table::ALL.len());
        assert_eq!(
            select_tables(&["page".into(), "brand".into()]).unwrap(),
            vec![Table::Brand, Table::Page]
        );
        assert!(select_tables(&["admin_user".into()]).is_err());
    }

    #[tokio::test]
    async fn test_write_files_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/exports");
        let files = vec![ExportFile {
            file_name: "brand-20240101-000000.json".into(),
            format: ExportFormat::Json,
            body: b"[]".to_vec(),
        }];

        let written = write_files(&out, &files).await.unwrap();
        assert_eq!(written, vec![out.join("brand-20240101-000000.json")]);
        assert_eq!(tokio::fs::read(&written[0]).await.unwrap(), b"[]");
    }
}
