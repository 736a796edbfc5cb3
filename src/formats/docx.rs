//! Word (DOCX) reader.
//!
//! Walks `word/document.xml` once with a pull parser. Paragraph styles named
//! `Heading1`…`Heading9` or `Title` become ATX headings, numbered/bulleted
//! paragraphs become `- ` items, and top-level tables become GFM tables.
//! Nested tables are flattened into the enclosing cell.

use super::markdown_table;
use super::ooxml::{attr_value, core_title, open_package, read_required_part};
use crate::error::ConversionError;
use crate::output::ConvertedDocument;
use quick_xml::events::Event;
use quick_xml::Reader;

const FORMAT: &str = "DOCX";

pub fn convert(bytes: &[u8], filename: &str) -> Result<ConvertedDocument, ConversionError> {
    let mut package = open_package(bytes, filename, FORMAT)?;
    let xml = read_required_part(&mut package, "word/document.xml", filename, FORMAT)?;
    let title = core_title(&mut package);
    let markdown = render_document(&xml)
        .map_err(|e| ConversionError::malformed(filename, FORMAT, e))?;
    Ok(ConvertedDocument::new(markdown, title))
}

#[derive(Default)]
struct Paragraph {
    text: String,
    style: Option<String>,
    list_item: bool,
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

fn render_document(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut blocks: Vec<String> = Vec::new();
    let mut para = Paragraph::default();
    let mut table = Table::default();
    let mut table_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => para = Paragraph::default(),
                b"t" => in_text = true,
                b"pStyle" => para.style = attr_value(&e, b"val"),
                b"numPr" => para.list_item = true,
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table = Table::default();
                    }
                }
                b"tr" if table_depth == 1 => table.row.clear(),
                b"tc" if table_depth == 1 => table.cell.clear(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"pStyle" => para.style = attr_value(&e, b"val"),
                b"numPr" => para.list_item = true,
                b"tab" => para.text.push('\t'),
                b"br" | b"cr" => para.text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => para.text.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let p = std::mem::take(&mut para);
                    if table_depth > 0 {
                        let text = p.text.trim();
                        if !text.is_empty() {
                            if !table.cell.is_empty() {
                                table.cell.push(' ');
                            }
                            table.cell.push_str(text);
                        }
                    } else if let Some(block) = render_paragraph(&p) {
                        blocks.push(block);
                    }
                }
                b"tc" if table_depth == 1 => {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell);
                }
                b"tr" if table_depth == 1 => {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 && !table.rows.is_empty() {
                        blocks.push(markdown_table(&table.rows));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks.join("\n\n"))
}

fn render_paragraph(p: &Paragraph) -> Option<String> {
    let text = p.text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(level) = p.style.as_deref().and_then(heading_level) {
        // Headings must stay on one line.
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        return Some(format!("{} {}", "#".repeat(level), flat));
    }
    if p.list_item {
        return Some(format!("- {text}"));
    }
    Some(text.to_string())
}

/// `Heading2` → 2, `Title` → 1. Levels deeper than 6 render as `######`.
fn heading_level(style: &str) -> Option<usize> {
    let style = style.to_ascii_lowercase();
    if style == "title" {
        return Some(1);
    }
    style
        .strip_prefix("heading")
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .map(|n| n.min(6))
}
