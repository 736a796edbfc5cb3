//! Request-scoped data types: the upload going in, the result coming out.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw bytes of an uploaded file plus the filename the client declared.
///
/// Created once the multipart field is fully read and moved into the
/// conversion job; never shared between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// How the route treats the upload: markup text or a binary container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Html,
    Binary,
}

/// What a conversion backend produces for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Markdown rendering of the document.
    pub text_content: String,
    /// Document title, when the format carries one.
    pub title: Option<String>,
}

impl ConvertedDocument {
    pub fn new(text_content: impl Into<String>, title: Option<String>) -> Self {
        Self {
            text_content: text_content.into(),
            title,
        }
    }
}

/// Metadata block of a [`ConversionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversionMetadata {
    pub original_filename: String,
    /// Exact byte length of the uploaded body.
    pub file_size: usize,
    /// Guessed from the filename; `null` when unknown.
    pub mime_type: Option<String>,
    pub file_type: FileKind,
}

/// Successful response body of every `/parse_*` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversionResult {
    pub success: bool,
    pub filename: String,
    pub markdown_content: String,
    pub title: String,
    pub metadata: ConversionMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&FileKind::Html).unwrap(), "\"html\"");
        assert_eq!(
            serde_json::to_string(&FileKind::Binary).unwrap(),
            "\"binary\""
        );
    }

    #[test]
    fn result_json_shape() {
        let result = ConversionResult {
            success: true,
            filename: "a.htm".into(),
            markdown_content: "# A\n".into(),
            title: "A".into(),
            metadata: ConversionMetadata {
                original_filename: "a.htm".into(),
                file_size: 12,
                mime_type: None,
                file_type: FileKind::Html,
            },
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["markdown_content"], "# A\n");
        assert_eq!(v["metadata"]["file_size"], 12);
        assert!(v["metadata"]["mime_type"].is_null());
        assert_eq!(v["metadata"]["file_type"], "html");
    }
}
