//! The fixed table of conversion endpoints and upload validation.

use crate::error::ApiError;
use crate::formats::file_extension;
use crate::output::{FileKind, UploadedFile};

/// One `POST /parse_*` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentRoute {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Html,
}

impl DocumentRoute {
    pub const ALL: [DocumentRoute; 5] = [
        DocumentRoute::Pdf,
        DocumentRoute::Docx,
        DocumentRoute::Xlsx,
        DocumentRoute::Pptx,
        DocumentRoute::Html,
    ];

    pub fn path(self) -> &'static str {
        match self {
            DocumentRoute::Pdf => "/parse_pdf",
            DocumentRoute::Docx => "/parse_docx",
            DocumentRoute::Xlsx => "/parse_xlsx",
            DocumentRoute::Pptx => "/parse_pptx",
            DocumentRoute::Html => "/parse_html",
        }
    }

    /// Lower-case extensions (no dot) this route accepts.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            DocumentRoute::Pdf => &["pdf"],
            DocumentRoute::Docx => &["docx"],
            DocumentRoute::Xlsx => &["xlsx", "xls"],
            DocumentRoute::Pptx => &["pptx", "ppt"],
            DocumentRoute::Html => &["html", "htm"],
        }
    }

    pub fn file_kind(self) -> FileKind {
        match self {
            DocumentRoute::Html => FileKind::Html,
            _ => FileKind::Binary,
        }
    }

    /// One-line summary listed by `GET /`.
    pub fn description(self) -> &'static str {
        match self {
            DocumentRoute::Pdf => "Convert PDF files to Markdown",
            DocumentRoute::Docx => "Convert Word documents to Markdown",
            DocumentRoute::Xlsx => "Convert Excel files to Markdown",
            DocumentRoute::Pptx => "Convert PowerPoint presentations to Markdown",
            DocumentRoute::Html => "Convert HTML files to Markdown",
        }
    }

    pub fn accepts(self, filename: &str) -> bool {
        let ext = file_extension(filename);
        self.accepted_extensions().contains(&ext.as_str())
    }
}

/// Check an upload against `route` before any conversion work is queued.
///
/// Checks run in order: filename present and non-empty, extension accepted,
/// body non-empty. The first failure wins.
pub fn validate_upload(
    route: DocumentRoute,
    filename: Option<String>,
    bytes: Vec<u8>,
) -> Result<UploadedFile, ApiError> {
    let filename = match filename {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::bad_request("No file provided")),
    };

    if !route.accepts(&filename) {
        let expected = route.accepted_extensions().join(", ");
        return Err(ApiError::rejected(filename, format!("Invalid file type. Expected: {expected}")));
    }

    if bytes.is_empty() {
        return Err(ApiError::rejected(filename, "Empty file provided"));
    }

    Ok(UploadedFile::new(filename, bytes))
}
