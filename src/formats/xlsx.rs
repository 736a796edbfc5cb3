//! Spreadsheet (XLSX / XLS) reader.
//!
//! Every non-empty sheet becomes a `## <sheet name>` section followed by a
//! GFM table whose first row is the header. calamine picks the container
//! format itself, so legacy BIFF workbooks go through the same path.

use super::markdown_table;
use crate::error::ConversionError;
use crate::output::ConvertedDocument;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::debug;

const FORMAT: &str = "spreadsheet";

pub fn convert(bytes: &[u8], filename: &str) -> Result<ConvertedDocument, ConversionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ConversionError::malformed(filename, FORMAT, e))?;

    let mut sections = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ConversionError::malformed(filename, FORMAT, format!("sheet '{name}': {e}")))?;
        match render_sheet(&name, &range) {
            Some(section) => sections.push(section),
            None => debug!(sheet = %name, "Skipping empty sheet"),
        }
    }

    Ok(ConvertedDocument::new(sections.join("\n\n"), None))
}

fn render_sheet(name: &str, range: &Range<Data>) -> Option<String> {
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(format!("## {}\n\n{}", name, markdown_table(&rows)))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
