//! HTML reader.
//!
//! The body is decoded as UTF-8 (invalid sequences replaced), `<script>` and
//! `<style>` blocks are dropped, and the rest is converted with `html2md`.
//! The document title comes from the first `<title>` element.

use crate::error::ConversionError;
use crate::output::ConvertedDocument;
use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::Regex;

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").unwrap());

static RE_NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<head\b[^>]*>.*?</head\s*>")
        .unwrap()
});

pub fn convert(bytes: &[u8], _filename: &str) -> Result<ConvertedDocument, ConversionError> {
    let html = String::from_utf8_lossy(bytes);
    let title = extract_title(&html);
    let body = RE_NON_CONTENT.replace_all(&html, "");
    let markdown = html2md::parse_html(&body);
    Ok(ConvertedDocument::new(markdown, title))
}

fn extract_title(html: &str) -> Option<String> {
    let raw = RE_TITLE.captures(html)?.get(1)?.as_str();
    let title = decode_entities(raw).split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#?[0-9A-Za-z]+;").unwrap());

/// Decode named (HTML5) and numeric character references. Unknown ones are
/// left as written.
fn decode_entities(s: &str) -> String {
    RE_ENTITY
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let entity = &caps[0];
            unescape_with(entity, resolve_html5_entity)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| entity.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_headings_and_paragraphs() {
        let html = b"<html><head><title>Release Notes</title></head><body><h1>Version 2</h1><p>Faster <b>imports</b>.</p></body></html>";
        let doc = convert(html, "notes.html").unwrap();
        assert_eq!(doc.title.as_deref(), Some("Release Notes"));
        assert!(doc.text_content.contains("Version 2"), "got: {}", doc.text_content);
        assert!(doc.text_content.contains("**imports**"), "got: {}", doc.text_content);
        assert!(!doc.text_content.contains("Release Notes"), "title leaked into body");
    }

    #[test]
    fn scripts_and_styles_are_dropped() {
        let html = b"<body><script>var secret = 1;</script><style>p{color:red}</style><p>Visible</p></body>";
        let doc = convert(html, "page.htm").unwrap();
        assert!(doc.text_content.contains("Visible"));
        assert!(!doc.text_content.contains("secret"));
        assert!(!doc.text_content.contains("color"));
    }

    #[test]
    fn title_whitespace_and_entities() {
        assert_eq!(
            extract_title("<TITLE>\n  Q&amp;A \n  Digest </TITLE>").as_deref(),
            Some("Q&A Digest")
        );
        assert_eq!(extract_title("<title>   </title>"), None);
        assert_eq!(extract_title("<title>&nbsp;</title>"), None);
        assert_eq!(extract_title("<p>no title</p>"), None);
    }

    #[test]
    fn title_numeric_and_named_references() {
        assert_eq!(
            extract_title("<title>Caf&eacute; &#8212; Men&#x27;s &amp; Kids</title>").as_deref(),
            Some("Café — Men's & Kids")
        );
        assert_eq!(extract_title("<title>A&nbsp;&nbsp;B</title>").as_deref(), Some("A B"));
        // Bare ampersands and unknown names pass through.
        assert_eq!(
            extract_title("<title>R & D &notanentity;</title>").as_deref(),
            Some("R & D &notanentity;")
        );
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let doc = convert(b"<p>caf\xE9</p>", "x.html").unwrap();
        assert!(doc.text_content.contains("caf"));
    }
}
