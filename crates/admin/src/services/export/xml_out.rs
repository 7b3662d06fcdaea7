//! XML layout.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <table name="brand">
//!   <row>
//!     <id>1</id>
//!     <description/>
//!   </row>
//! </table>
//! ```

use core::fmt::Write as _;

use quick_xml::escape::escape;

use super::{TableData, cell_text};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

pub(super) fn render(data: &TableData) -> String {
    let mut out = String::from(DECLARATION);
    write_table(&mut out, data, 0);
    out
}

/// Tables wrapped in a `<database>` root.
pub(super) fn render_combined(data: &[TableData]) -> String {
    let mut out = String::from(DECLARATION);
    out.push_str("<database>\n");
    for table in data {
        write_table(&mut out, table, 1);
    }
    out.push_str("</database>\n");
    out
}

fn write_table(out: &mut String, data: &TableData, depth: usize) {
    let pad = "  ".repeat(depth);
    let _ = writeln!(out, "{pad}<table name=\"{}\">", escape(data.table.name()));

    let columns = data.columns();
    for row in &data.rows {
        let _ = writeln!(out, "{pad}  <row>");
        for column in &columns {
            let name = escape(*column);
            match row.get(*column).and_then(cell_text) {
                Some(text) => {
                    let _ = writeln!(out, "{pad}    <{name}>{}</{name}>", escape(text.as_str()));
                }
                None => {
                    let _ = writeln!(out, "{pad}    <{name}/>");
                }
            }
        }
        let _ = writeln!(out, "{pad}  </row>");
    }

    let _ = writeln!(out, "{pad}</table>");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tables::Table;
    use crate::services::export::tests::brands;

    #[test]
    fn test_render_escapes_and_self_closes_null() {
        let out = render(&brands());
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<table name=\"brand\">\n"));
        assert!(out.contains("    <description/>\n"));
        assert!(out.contains("<name>Say &quot;hi&quot;</name>"));
        assert!(out.ends_with("</table>\n"));
    }

    #[test]
    fn test_render_escapes_markup() {
        let mut data = brands();
        data.rows.truncate(1);
        data.rows[0].insert("name".to_owned(), serde_json::json!("<b>Tom & Jerry's</b>"));
        let out = render(&data);
        assert!(out.contains("<name>&lt;b&gt;Tom &amp; Jerry&apos;s&lt;/b&gt;</name>"), "{out}");
    }

    #[test]
    fn test_render_combined_database_root() {
        let pages = TableData {
            table: Table::Page,
            rows: Vec::new(),
            schema_columns: Vec::new(),
        };
        let out = render_combined(&[brands(), pages]);
        assert!(out.contains("<database>\n  <table name=\"brand\">\n    <row>\n      <id>1</id>"));
        assert!(out.ends_with("  <table name=\"page\">\n  </table>\n</database>\n"));
    }
}
