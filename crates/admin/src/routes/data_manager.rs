//! Data manager API: table export and fixture import.

use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    db::{
        TableRepository,
        settings::{self, LAST_IMPORT},
        tables::{Table, TableInfo},
    },
    error::AppError,
    middleware::{RequireAdminAuth, RequireSuperAdmin},
    services::{
        ExportFile, ExportFormat, ImportReport,
        export::{load_tables, render_combined, render_table},
        import::{import_table, import_tables},
    },
    state::AppState,
};

/// Build the data manager router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/data-manager/tables", get(tables))
        .route("/api/data-manager/export", get(export))
        .route("/api/data-manager/export/{table}", get(export_table))
        .route("/api/data-manager/insert-table", post(insert_table))
        .route("/api/data-manager/insert-all", post(insert_all))
}

/// Export query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Comma-separated table names; every table when absent.
    pub tables: Option<String>,
    pub format: Option<String>,
}

impl ExportQuery {
    fn format(&self) -> Result<ExportFormat, AppError> {
        Ok(self
            .format
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default())
    }

    fn tables(&self) -> Result<Vec<Table>, AppError> {
        match self.tables.as_deref() {
            None => Ok(Table::ALL.to_vec()),
            Some(raw) => Ok(Table::parse_list(raw)?),
        }
    }
}

/// Tables listing response.
#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<TableInfo>,
    pub formats: [ExportFormat; 3],
}

/// Single-table import body.
#[derive(Debug, Deserialize)]
pub struct InsertTableRequest {
    pub table: Table,
    /// Directory under the fixtures root; the root itself when absent.
    pub source_dir: Option<String>,
}

/// Import-everything body.
#[derive(Debug, Default, Deserialize)]
pub struct InsertAllRequest {
    pub source_dir: Option<String>,
}

/// Resolve a client-supplied source directory under `root`.
///
/// Only plain relative paths are accepted.
fn source_dir(root: &FsPath, requested: Option<&str>) -> Result<PathBuf, AppError> {
    let Some(requested) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(root.to_owned());
    };
    let relative = FsPath::new(requested);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(AppError::BadRequest(format!(
            "source_dir must be a relative path inside the fixtures directory: {requested}"
        )));
    }
    Ok(root.join(relative))
}

fn attachment(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.format.content_type().to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.body,
    )
        .into_response()
}

#[instrument(skip(_admin, state))]
async fn tables(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<TablesResponse>, AppError> {
    let tables = TableRepository::new(state.pool()).row_counts().await?;
    Ok(Json(TablesResponse {
        tables,
        formats: [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Xml],
    }))
}

/// Several tables in one file.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn export(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = query.format()?;
    let tables = query.tables()?;
    let data = load_tables(state.pool(), &tables).await?;
    let file = render_combined(format, &data, Utc::now())?;

    tracing::info!(
        file = %file.file_name,
        tables = tables.len(),
        bytes = file.body.len(),
        "Data export generated"
    );
    Ok(attachment(file))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn export_table(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let table: Table = table.parse()?;
    let format = query.format()?;
    let data = load_tables(state.pool(), &[table]).await?;
    let Some(data) = data.first() else {
        return Err(AppError::Internal(format!("no rows loaded for {table}")));
    };
    let file = render_table(format, data, Utc::now())?;
    tracing::info!(file = %file.file_name, rows = data.rows.len(), "Table export generated");
    Ok(attachment(file))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id, table = %body.table))]
async fn insert_table(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<InsertTableRequest>,
) -> Result<Json<ImportReport>, AppError> {
    let dir = source_dir(&state.config().paths.fixtures_dir, body.source_dir.as_deref())?;
    let started_at = Utc::now();
    let table_report = import_table(state.pool(), &dir, body.table).await?;
    let report = ImportReport::for_table(&dir, table_report, started_at);
    record_import(&state, &report).await;
    Ok(Json(report))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn insert_all(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    body: Option<Json<InsertAllRequest>>,
) -> Result<Json<ImportReport>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let dir = source_dir(&state.config().paths.fixtures_dir, body.source_dir.as_deref())?;
    let report = import_tables(state.pool(), &dir, &[]).await;
    record_import(&state, &report).await;
    Ok(Json(report))
}

async fn record_import(state: &AppState, report: &ImportReport) {
    tracing::info!(
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failed,
        skipped = report.skipped.len(),
        failed_tables = report.failed_tables.len(),
        "Fixture import finished"
    );
    if let Err(e) = settings::set_typed(state.pool(), LAST_IMPORT, report).await {
        tracing::warn!(error = %e, "Failed to record import report");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_source_dir_stays_under_root() {
        let root = FsPath::new("/srv/fixtures");
        assert_eq!(source_dir(root, None).unwrap(), root);
        assert_eq!(source_dir(root, Some("  ")).unwrap(), root);
        assert_eq!(
            source_dir(root, Some("2024/spring")).unwrap(),
            root.join("2024/spring")
        );
        assert!(source_dir(root, Some("../etc")).is_err());
        assert!(source_dir(root, Some("/etc")).is_err());
    }

    #[test]
    fn test_export_query_defaults() {
        let query = ExportQuery::default();
        assert_eq!(query.format().unwrap(), ExportFormat::Json);
        assert_eq!(query.tables().unwrap(), Table::ALL.to_vec());
    }

    #[test]
    fn test_export_query_parses_selection() {
        let query = ExportQuery {
            tables: Some("product, brand".to_owned()),
            format: Some("CSV".to_owned()),
        };
        assert_eq!(query.format().unwrap(), ExportFormat::Csv);
        assert_eq!(query.tables().unwrap(), vec![Table::Brand, Table::Product]);

        let query = ExportQuery {
            tables: Some("users".to_owned()),
            format: Some("yaml".to_owned()),
        };
        assert!(query.tables().is_err());
        assert!(query.format().is_err());
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment(ExportFile {
            file_name: "brand-20240102-030405.csv".to_owned(),
            format: ExportFormat::Csv,
            body: b"id\n1\n".to_vec(),
        });
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"brand-20240102-030405.csv\""
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
    }
}
