//! Shared helpers for Office Open XML packages (DOCX, XLSX, PPTX).
//!
//! An OOXML file is a zip archive of XML parts. The readers here only need
//! three things from the container: open it from memory, read a part as a
//! string, and pull the document title out of `docProps/core.xml`.

use super::DocumentFormat;
use crate::error::ConversionError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// An OOXML package opened over an in-memory buffer.
pub type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open `bytes` as a zip package.
pub fn open_package<'a>(
    bytes: &'a [u8],
    filename: &str,
    format: &'static str,
) -> Result<Package<'a>, ConversionError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ConversionError::malformed(filename, format, format!("not a zip package: {e}")))
}

/// Read a part as UTF-8 text. `Ok(None)` when the part does not exist.
pub fn read_part(
    package: &mut Package<'_>,
    name: &str,
    filename: &str,
    format: &'static str,
) -> Result<Option<String>, ConversionError> {
    let mut file = match package.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ConversionError::malformed(filename, format, format!("{name}: {e}"))),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ConversionError::malformed(filename, format, format!("{name}: {e}")))?;
    Ok(Some(xml))
}

/// Read a part that must be present.
pub fn read_required_part(
    package: &mut Package<'_>,
    name: &str,
    filename: &str,
    format: &'static str,
) -> Result<String, ConversionError> {
    read_part(package, name, filename, format)?
        .ok_or_else(|| ConversionError::malformed(filename, format, format!("missing {name}")))
}

/// `dc:title` from `docProps/core.xml`, when present and non-blank.
pub fn core_title(package: &mut Package<'_>) -> Option<String> {
    let xml = match package.by_name("docProps/core.xml") {
        Ok(mut file) => {
            let mut xml = String::new();
            file.read_to_string(&mut xml).ok()?;
            xml
        }
        Err(_) => return None,
    };

    let mut reader = Reader::from_str(&xml);
    let mut in_title = false;
    let mut title = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"title" => in_title = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"title" => break,
            Ok(Event::Text(t)) if in_title => title.push_str(&t.unescape().ok()?),
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Value of the attribute whose local name is `key` (prefix ignored).
pub fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Tell DOCX, XLSX and PPTX apart by their main part.
pub fn sniff_package(bytes: &[u8]) -> Option<DocumentFormat> {
    let package = ZipArchive::new(Cursor::new(bytes)).ok()?;
    let has = |name: &str| package.file_names().any(|n| n == name);
    if has("word/document.xml") {
        Some(DocumentFormat::Docx)
    } else if has("xl/workbook.xml") {
        Some(DocumentFormat::Xlsx)
    } else if has("ppt/presentation.xml") {
        Some(DocumentFormat::Pptx)
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{build_package, core_xml};
    use super::*;

    #[test]
    fn reads_core_title() {
        let bytes = build_package(&[("docProps/core.xml", &core_xml("Quarterly &amp; Annual"))]);
        let mut package = open_package(&bytes, "t.docx", "DOCX").unwrap();
        assert_eq!(core_title(&mut package).as_deref(), Some("Quarterly & Annual"));
    }

    #[test]
    fn blank_core_title_is_none() {
        let bytes = build_package(&[("docProps/core.xml", &core_xml("   "))]);
        let mut package = open_package(&bytes, "t.docx", "DOCX").unwrap();
        assert_eq!(core_title(&mut package), None);
    }

    #[test]
    fn missing_part_is_none_but_required_part_errors() {
        let bytes = build_package(&[("a.xml", "<a/>")]);
        let mut package = open_package(&bytes, "t.pptx", "PPTX").unwrap();
        assert!(read_part(&mut package, "b.xml", "t.pptx", "PPTX").unwrap().is_none());
        let err = read_required_part(&mut package, "b.xml", "t.pptx", "PPTX").unwrap_err();
        assert!(err.to_string().contains("missing b.xml"), "got: {err}");
    }

    #[test]
    fn not_a_zip_is_malformed() {
        let err = open_package(b"plain text", "t.docx", "DOCX").unwrap_err();
        assert!(matches!(err, ConversionError::Malformed { .. }));
    }

    #[test]
    fn sniffs_package_family() {
        let docx = build_package(&[("word/document.xml", "<w:document/>")]);
        let xlsx = build_package(&[("xl/workbook.xml", "<workbook/>")]);
        let pptx = build_package(&[("ppt/presentation.xml", "<p:presentation/>")]);
        assert_eq!(sniff_package(&docx), Some(DocumentFormat::Docx));
        assert_eq!(sniff_package(&xlsx), Some(DocumentFormat::Xlsx));
        assert_eq!(sniff_package(&pptx), Some(DocumentFormat::Pptx));
        assert_eq!(sniff_package(&build_package(&[("x.txt", "x")])), None);
    }
}
