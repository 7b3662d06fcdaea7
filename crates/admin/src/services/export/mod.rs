//! Table export to JSON, CSV and XML.
//!
//! Rows arrive as JSON objects from [`TableRepository::fetch_rows`]; the
//! renderers here are pure and only decide layout.

mod csv_out;
mod xml_out;

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use crate::db::RepositoryError;
use crate::db::tables::{Table, TableRepository, UnknownTable};

/// Errors from export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    UnknownTable(#[from] UnknownTable),

    #[error("no tables selected")]
    NoTables,

    #[error("unknown export format '{0}'")]
    UnknownFormat(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Whether the error was caused by the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTable(_) | Self::NoTables | Self::UnknownFormat(_)
        )
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xml => "application/xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            _ => Err(ExportError::UnknownFormat(s.to_owned())),
        }
    }
}

/// All rows of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub table: Table,
    pub rows: Vec<Map<String, Value>>,
    /// Declared column names, used for the header when `rows` is empty.
    pub schema_columns: Vec<String>,
}

impl TableData {
    /// Union of column names across rows, in first-seen order. Falls back to
    /// `schema_columns` for an empty table.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        if self.rows.is_empty() {
            return self.schema_columns.iter().map(String::as_str).collect();
        }
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
        columns
    }
}

/// A rendered export file.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub body: Vec<u8>,
}

/// Read the given tables from the database.
///
/// # Errors
///
/// Returns `ExportError::NoTables` for an empty selection.
#[instrument(skip(pool))]
pub async fn load_tables(pool: &PgPool, tables: &[Table]) -> Result<Vec<TableData>, ExportError> {
    if tables.is_empty() {
        return Err(ExportError::NoTables);
    }

    let repo = TableRepository::new(pool);
    let mut data = Vec::with_capacity(tables.len());
    for &table in tables {
        let rows = repo.fetch_rows(table).await?;
        let schema_columns = if rows.is_empty() {
            repo.columns(table).await?
        } else {
            Vec::new()
        };
        info!(%table, rows = rows.len(), "Loaded table for export");
        data.push(TableData {
            table,
            rows,
            schema_columns,
        });
    }
    Ok(data)
}

/// Render one table as a standalone file.
///
/// # Errors
///
/// Returns `ExportError::Csv` or `ExportError::Json` if encoding fails.
pub fn render_table(
    format: ExportFormat,
    data: &TableData,
    now: DateTime<Utc>,
) -> Result<ExportFile, ExportError> {
    let body = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(&data.rows)?,
        ExportFormat::Csv => csv_out::render(data)?,
        ExportFormat::Xml => xml_out::render(data).into_bytes(),
    };

    Ok(ExportFile {
        file_name: format!("{}-{}.{}", data.table, timestamp(now), format.extension()),
        format,
        body,
    })
}

/// Render several tables into one combined file.
///
/// # Errors
///
/// Returns `ExportError::NoTables` for an empty selection, or an encoding
/// error.
pub fn render_combined(
    format: ExportFormat,
    data: &[TableData],
    now: DateTime<Utc>,
) -> Result<ExportFile, ExportError> {
    if data.is_empty() {
        return Err(ExportError::NoTables);
    }

    let body = match format {
        ExportFormat::Json => {
            let combined: Map<String, Value> = data
                .iter()
                .map(|d| {
                    let rows = d.rows.iter().cloned().map(Value::Object).collect();
                    (d.table.name().to_owned(), Value::Array(rows))
                })
                .collect();
            serde_json::to_vec_pretty(&combined)?
        }
        ExportFormat::Csv => csv_out::render_combined(data)?,
        ExportFormat::Xml => xml_out::render_combined(data).into_bytes(),
    };

    Ok(ExportFile {
        file_name: format!("export-{}.{}", timestamp(now), format.extension()),
        format,
        body,
    })
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// Flat text form of a JSON value, shared by CSV and XML.
///
/// `None` means null; nested objects and arrays become JSON text.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn brands() -> TableData {
        let rows = [
            json!({"id": 1, "name": "Acme, Inc.", "description": null}),
            json!({"id": 2, "name": "Say \"hi\"", "logo_url": "https://x/y.png"}),
        ];
        TableData {
            table: Table::Brand,
            rows: rows
                .into_iter()
                .map(|r| match r {
                    Value::Object(m) => m,
                    _ => unreachable!(),
                })
                .collect(),
            schema_columns: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn test_columns_union_first_seen() {
        assert_eq!(brands().columns(), vec!["id", "name", "description", "logo_url"]);
    }

    #[test]
    fn test_columns_ignore_schema_when_rows_exist() {
        let mut data = brands();
        data.schema_columns = vec!["id".to_owned(), "slug".to_owned()];
        assert_eq!(data.columns(), vec!["id", "name", "description", "logo_url"]);

        data.rows.clear();
        assert_eq!(data.columns(), vec!["id", "slug"]);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "yaml".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_render_table_json_is_array() {
        let file = render_table(ExportFormat::Json, &brands(), now()).unwrap();
        assert_eq!(file.file_name, "brand-20260304-050607.json");

        let parsed: Value = serde_json::from_slice(&file.body).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["name"], "Acme, Inc.");
    }

    #[test]
    fn test_render_combined_json_keyed_by_table() {
        let pages = TableData {
            table: Table::Page,
            rows: Vec::new(),
            schema_columns: Vec::new(),
        };
        let file = render_combined(ExportFormat::Json, &[brands(), pages], now()).unwrap();
        assert_eq!(file.file_name, "export-20260304-050607.json");

        let parsed: Value = serde_json::from_slice(&file.body).unwrap();
        assert_eq!(parsed["brand"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["page"], json!([]));
    }

    #[test]
    fn test_render_combined_requires_tables() {
        assert!(matches!(
            render_combined(ExportFormat::Csv, &[], now()),
            Err(ExportError::NoTables)
        ));
    }
}
