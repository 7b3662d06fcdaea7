//! Export rendering across formats and table selection.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use emporium_admin::db::tables::Table;
use emporium_admin::services::export::{TableData, render_combined, render_table};
use emporium_admin::services::{ExportError, ExportFormat};
use serde_json::{Map, Value, json};

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixture rows are objects"),
    }
}

fn fixture() -> Vec<TableData> {
    vec![
        TableData {
            table: Table::Brand,
            rows: vec![row(json!({ "id": 1, "name": "Acme, Inc.", "description": null }))],
            schema_columns: Vec::new(),
        },
        TableData {
            table: Table::Coupon,
            rows: vec![row(json!({ "id": 7, "code": "SUMMER10", "value": "10.00", "active": true }))],
            schema_columns: Vec::new(),
        },
    ]
}

#[test]
fn test_table_selection_keeps_foreign_key_order() {
    let tables = Table::parse_list("page, coupon,brand,,brand").unwrap();
    assert_eq!(tables, vec![Table::Brand, Table::Coupon, Table::Page]);
    assert!(Table::parse_list("brand,admin_user").is_err());
}

#[test]
fn test_format_parsing() {
    assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    assert!(matches!(
        "yaml".parse::<ExportFormat>(),
        Err(ExportError::UnknownFormat(_))
    ));
}

#[test]
fn test_per_table_file_names() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
    let data = fixture();

    let json = render_table(ExportFormat::Json, &data[0], now).unwrap();
    assert_eq!(json.file_name, "brand-20240309-140500.json");

    let xml = render_table(ExportFormat::Xml, &data[1], now).unwrap();
    assert_eq!(xml.file_name, "coupon-20240309-140500.xml");
    let body = String::from_utf8(xml.body).unwrap();
    assert!(body.contains("<table name=\"coupon\">"));
    assert!(body.contains("<code>SUMMER10</code>"));
}

#[test]
fn test_combined_json_is_keyed_by_table() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
    let file = render_combined(ExportFormat::Json, &fixture(), now).unwrap();
    assert_eq!(file.file_name, "export-20240309-140500.json");

    let value: Value = serde_json::from_slice(&file.body).unwrap();
    assert_eq!(value["brand"][0]["name"], "Acme, Inc.");
    assert_eq!(value["coupon"][0]["code"], "SUMMER10");
}

#[test]
fn test_combined_csv_sections() {
    let file = render_combined(ExportFormat::Csv, &fixture(), Utc::now()).unwrap();
    let body = String::from_utf8(file.body).unwrap();

    assert!(body.starts_with("# table: brand\nid,name,description\n1,\"Acme, Inc.\",\n"));
    assert!(body.contains("\n\n# table: coupon\n"));
}

#[test]
fn test_combined_xml_has_database_root() {
    let file = render_combined(ExportFormat::Xml, &fixture(), Utc::now()).unwrap();
    let body = String::from_utf8(file.body).unwrap();

    assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<database>\n"));
    assert!(body.trim_end().ends_with("</database>"));
}

#[test]
fn test_combined_requires_tables() {
    assert!(matches!(
        render_combined(ExportFormat::Json, &[], Utc::now()),
        Err(ExportError::NoTables)
    ));
}
