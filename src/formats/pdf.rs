//! PDF reader: text-layer extraction.
//!
//! Only the embedded text layer is read; scanned pages without one produce
//! empty output rather than an error. Page breaks (form feeds) become blank
//! lines so paragraphs on consecutive pages do not run together.

use crate::error::ConversionError;
use crate::output::ConvertedDocument;

const FORMAT: &str = "PDF";

pub fn convert(bytes: &[u8], filename: &str) -> Result<ConvertedDocument, ConversionError> {
    if !bytes.starts_with(b"%PDF") {
        let magic: Vec<u8> = bytes.iter().take(4).copied().collect();
        return Err(ConversionError::malformed(
            filename,
            FORMAT,
            format!("first bytes {magic:?} are not %PDF"),
        ));
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ConversionError::malformed(filename, FORMAT, e))?;

    Ok(ConvertedDocument::new(normalise_page_breaks(&text), None))
}

fn normalise_page_breaks(text: &str) -> String {
    text.split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
