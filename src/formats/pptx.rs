//! PowerPoint (PPTX) reader.
//!
//! Slides are read in numeric order (`slide1.xml`, `slide2.xml`, …) and each
//! is introduced by a `<!-- Slide number: N -->` marker. Title placeholders
//! become `#` headings, other text frames become paragraphs, and `a:tbl`
//! graphic frames become GFM tables.

use super::markdown_table;
use super::ooxml::{attr_value, core_title, open_package, read_part, Package};
use crate::error::ConversionError;
use crate::output::ConvertedDocument;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

const FORMAT: &str = "PPTX";

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

pub fn convert(bytes: &[u8], filename: &str) -> Result<ConvertedDocument, ConversionError> {
    let mut package = open_package(bytes, filename, FORMAT)?;
    if read_part(&mut package, "ppt/presentation.xml", filename, FORMAT)?.is_none() {
        return Err(ConversionError::malformed(
            filename,
            FORMAT,
            "missing ppt/presentation.xml",
        ));
    }

    let mut rendered = Vec::new();
    let mut first_title: Option<String> = None;
    for (number, part) in slide_parts(&package) {
        let Some(xml) = read_part(&mut package, &part, filename, FORMAT)? else {
            continue;
        };
        let slide = render_slide(&xml).map_err(|e| ConversionError::malformed(filename, FORMAT, e))?;
        if first_title.is_none() {
            first_title = slide.title.clone();
        }
        let mut section = format!("<!-- Slide number: {number} -->");
        if !slide.blocks.is_empty() {
            section.push_str("\n\n");
            section.push_str(&slide.blocks.join("\n\n"));
        }
        rendered.push(section);
    }

    let title = core_title(&mut package).or(first_title);
    Ok(ConvertedDocument::new(rendered.join("\n\n"), title))
}

/// Slide part names sorted by slide number.
fn slide_parts(package: &Package<'_>) -> Vec<(u32, String)> {
    let mut parts: Vec<(u32, String)> = package
        .file_names()
        .filter_map(|name| {
            let caps = RE_SLIDE_PART.captures(name)?;
            let number = caps[1].parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    parts.sort_by_key(|(n, _)| *n);
    parts
}

#[derive(Debug, Default)]
struct Slide {
    title: Option<String>,
    blocks: Vec<String>,
}

#[derive(Default)]
struct Shape {
    is_title: bool,
    paragraphs: Vec<String>,
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

fn render_slide(xml: &str) -> Result<Slide, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut slide = Slide::default();
    let mut shape: Option<Shape> = None;
    let mut table: Option<Table> = None;
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => shape = Some(Shape::default()),
                b"ph" => mark_title(&mut shape, attr_value(&e, b"type")),
                b"tbl" => table = Some(Table::default()),
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"ph" => mark_title(&mut shape, attr_value(&e, b"type")),
                b"br" => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => paragraph.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = paragraph.trim().to_string();
                    paragraph.clear();
                    if text.is_empty() {
                        continue;
                    }
                    if let Some(table) = table.as_mut() {
                        if !table.cell.is_empty() {
                            table.cell.push(' ');
                        }
                        table.cell.push_str(&text);
                    } else if let Some(shape) = shape.as_mut() {
                        shape.paragraphs.push(text);
                    }
                }
                b"tc" => {
                    if let Some(table) = table.as_mut() {
                        let cell = std::mem::take(&mut table.cell);
                        table.row.push(cell);
                    }
                }
                b"tr" => {
                    if let Some(table) = table.as_mut() {
                        let row = std::mem::take(&mut table.row);
                        table.rows.push(row);
                    }
                }
                b"tbl" => {
                    if let Some(table) = table.take() {
                        if !table.rows.is_empty() {
                            slide.blocks.push(markdown_table(&table.rows));
                        }
                    }
                }
                b"sp" => {
                    if let Some(shape) = shape.take() {
                        push_shape(&mut slide, shape);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(slide)
}

fn mark_title(shape: &mut Option<Shape>, ph_type: Option<String>) {
    if let (Some(shape), Some(kind)) = (shape.as_mut(), ph_type) {
        if kind == "title" || kind == "ctrTitle" {
            shape.is_title = true;
        }
    }
}

fn push_shape(slide: &mut Slide, shape: Shape) {
    if shape.paragraphs.is_empty() {
        return;
    }
    if shape.is_title {
        let heading = shape
            .paragraphs
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        if slide.title.is_none() {
            slide.title = Some(heading.clone());
        }
        slide.blocks.push(format!("# {heading}"));
    } else {
        slide.blocks.push(shape.paragraphs.join("\n"));
    }
}
