//! The conversion backend seam.
//!
//! [`DocumentConverter`] is the single capability the HTTP layer depends on:
//! bytes plus a filename in, Markdown plus an optional title out. The crate
//! ships [`NativeConverter`]; tests plug in stubs.
//!
//! Shaping the backend output into the response body ([`build_result`]) is
//! kept separate from the backend so every implementation yields the same
//! JSON.

use crate::error::ConversionError;
use crate::formats::{self, DocumentFormat};
use crate::output::{ConversionMetadata, ConversionResult, ConvertedDocument, FileKind, UploadedFile};
use crate::postprocess;
use tracing::debug;

/// Turns one document into Markdown.
///
/// Implementations are called from worker threads and may block freely.
/// Any failure is reported once; the caller never retries.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, bytes: &[u8], filename: &str) -> Result<ConvertedDocument, ConversionError>;
}

/// Run the backend for one upload and shape the response body.
pub fn convert_upload(
    converter: &dyn DocumentConverter,
    upload: UploadedFile,
    kind: FileKind,
) -> Result<ConversionResult, ConversionError> {
    let document = converter.convert(&upload.bytes, &upload.filename)?;
    Ok(build_result(upload, kind, document))
}

/// Build the success payload. The title falls back to the filename when the
/// backend produced none (or only whitespace).
pub fn build_result(upload: UploadedFile, kind: FileKind, document: ConvertedDocument) -> ConversionResult {
    let title = document
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| upload.filename.clone());

    ConversionResult {
        success: true,
        filename: upload.filename.clone(),
        markdown_content: document.text_content,
        title,
        metadata: ConversionMetadata {
            mime_type: guess_mime_type(&upload.filename),
            file_size: upload.bytes.len(),
            original_filename: upload.filename,
            file_type: kind,
        },
    }
}

/// MIME type guessed from the filename's extension.
pub fn guess_mime_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Built-in backend: dispatches to the readers in [`crate::formats`] and
/// normalises their output with [`postprocess::clean_markdown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl NativeConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for NativeConverter {
    fn convert(&self, bytes: &[u8], filename: &str) -> Result<ConvertedDocument, ConversionError> {
        let format = DocumentFormat::detect(filename, bytes).ok_or_else(|| {
            ConversionError::UnsupportedFormat {
                filename: filename.to_string(),
            }
        })?;
        debug!(filename, %format, bytes = bytes.len(), "Converting document");

        let document = match format {
            DocumentFormat::Pdf => formats::pdf::convert(bytes, filename)?,
            DocumentFormat::Docx => formats::docx::convert(bytes, filename)?,
            DocumentFormat::Xlsx | DocumentFormat::Xls => formats::xlsx::convert(bytes, filename)?,
            DocumentFormat::Pptx => formats::pptx::convert(bytes, filename)?,
            DocumentFormat::Html => formats::html::convert(bytes, filename)?,
            DocumentFormat::Ppt => {
                return Err(ConversionError::UnsupportedFormat {
                    filename: filename.to_string(),
                })
            }
        };

        Ok(ConvertedDocument {
            text_content: postprocess::clean_markdown(&document.text_content),
            title: document.title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl DocumentConverter for Fixed {
        fn convert(&self, _bytes: &[u8], _filename: &str) -> Result<ConvertedDocument, ConversionError> {
            Ok(ConvertedDocument::new("body", self.0.map(String::from)))
        }
    }

    #[test]
    fn result_shape_for_binary_upload() {
        let upload = UploadedFile::new("Budget.XLSX", vec![1u8; 37]);
        let result = convert_upload(&Fixed(Some("FY26")), upload, FileKind::Binary).unwrap();
        assert!(result.success);
        assert_eq!(result.filename, "Budget.XLSX");
        assert_eq!(result.title, "FY26");
        assert_eq!(result.markdown_content, "body");
        assert_eq!(result.metadata.original_filename, "Budget.XLSX");
        assert_eq!(result.metadata.file_size, 37);
        assert_eq!(result.metadata.file_type, FileKind::Binary);
        assert_eq!(
            result.metadata.mime_type.as_deref(),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        );
    }

    #[test]
    fn title_falls_back_to_filename() {
        let none = convert_upload(&Fixed(None), UploadedFile::new("a.pdf", b"x".to_vec()), FileKind::Binary).unwrap();
        assert_eq!(none.title, "a.pdf");
        let blank = convert_upload(&Fixed(Some("  ")), UploadedFile::new("b.pdf", b"x".to_vec()), FileKind::Binary).unwrap();
        assert_eq!(blank.title, "b.pdf");
    }

    #[test]
    fn mime_type_guessing() {
        assert_eq!(guess_mime_type("index.htm").as_deref(), Some("text/html"));
        assert_eq!(guess_mime_type("paper.pdf").as_deref(), Some("application/pdf"));
        assert_eq!(guess_mime_type("no_extension"), None);
    }

    #[test]
    fn native_converter_handles_html() {
        let doc = NativeConverter::new()
            .convert(b"<title>T</title><h2>Hi</h2><p>there</p>", "page.html")
            .unwrap();
        assert_eq!(doc.title.as_deref(), Some("T"));
        assert!(doc.text_content.contains("Hi"));
        assert!(doc.text_content.ends_with('\n'));
    }

    #[test]
    fn native_converter_rejects_legacy_ppt() {
        let err = NativeConverter::new()
            .convert(&[0xD0, 0xCF, 0x11, 0xE0], "old.ppt")
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFormat { .. }));
    }

    #[test]
    fn native_converter_reads_renamed_pptx() {
        use crate::formats::ooxml::test_support::build_package;

        let slide = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="x"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>Quarterly plan</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        let bytes = build_package(&[("ppt/presentation.xml", "<p:presentation/>"), ("ppt/slides/slide1.xml", slide)]);
        let doc = NativeConverter::new().convert(&bytes, "deck.ppt").unwrap();
        assert!(doc.text_content.contains("<!-- Slide number: 1 -->"), "got: {}", doc.text_content);
        assert!(doc.text_content.contains("Quarterly plan"), "got: {}", doc.text_content);
    }

    #[test]
    fn native_converter_keeps_html_line_breaks() {
        let doc = NativeConverter::new().convert(b"<p>a<br>b</p>", "br.html").unwrap();
        assert!(doc.text_content.contains("a  \nb"), "got: {:?}", doc.text_content);
    }

    #[test]
    fn native_converter_rejects_unknown_content() {
        let err = NativeConverter::new().convert(b"\x00\x00", "mystery").unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFormat { .. }));
    }
}
