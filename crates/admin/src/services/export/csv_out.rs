//! CSV layout.
//!
//! Fields are quoted only when they contain a comma, quote, CR or LF, with
//! quotes doubled. Null is an empty field.

use csv::{QuoteStyle, WriterBuilder};

use super::{ExportError, TableData, cell_text};

/// Header plus one record per row.
pub(super) fn render(data: &TableData) -> Result<Vec<u8>, ExportError> {
    let columns = data.columns();
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for row in &data.rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(*c).and_then(cell_text).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// One section per table, each preceded by `# table: <name>` and separated
/// by a blank line.
pub(super) fn render_combined(data: &[TableData]) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    for (i, table) in data.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(format!("# table: {}\n", table.table).as_bytes());
        out.extend(render(table)?);
    }
    Ok(out)
}
