//! Format readers used by [`crate::converter::NativeConverter`].
//!
//! Each submodule turns one family of document bytes into Markdown and an
//! optional title. All of them are blocking and allocation-heavy, which is why
//! they only ever run on a [`crate::pool::ConversionPool`] worker.
//!
//! ```text
//! bytes ──▶ DocumentFormat::detect ──▶ pdf | docx | xlsx | pptx | html ──▶ postprocess
//!           (extension, then magic)
//! ```

pub mod docx;
pub mod html;
pub mod ooxml;
pub mod pdf;
pub mod pptx;
pub mod xlsx;

use std::fmt;

/// Document families the native backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Xlsx,
    /// Legacy BIFF workbook; read by the same spreadsheet reader as XLSX.
    Xls,
    Pptx,
    /// Legacy binary presentation. Recognised but not convertible.
    Ppt,
    Html,
}

const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

impl DocumentFormat {
    /// Map a lower-case extension (no dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Identify a format from the leading bytes.
    ///
    /// Zip containers are opened to tell the three OOXML families apart.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }
        if bytes.starts_with(&ZIP_MAGIC) {
            return ooxml::sniff_package(bytes);
        }
        if bytes.starts_with(&OLE_MAGIC) {
            // Word/PowerPoint 97 files share the container; only workbooks
            // are readable, so that is the useful guess.
            return Some(Self::Xls);
        }
        let text_start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .map(|i| &bytes[i..])
            .unwrap_or(&[]);
        let text_start = text_start.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(text_start);
        if text_start.first() == Some(&b'<') {
            return Some(Self::Html);
        }
        None
    }

    /// Extension-based dispatch first, content sniffing when the extension
    /// is missing or unknown.
    ///
    /// A legacy `.ppt`/`.xls` name on a zip package is a renamed OOXML file;
    /// the package contents decide the format then.
    pub fn detect(filename: &str, bytes: &[u8]) -> Option<Self> {
        match Self::from_extension(&file_extension(filename)) {
            Some(legacy @ (Self::Ppt | Self::Xls)) if bytes.starts_with(&ZIP_MAGIC) => {
                Some(ooxml::sniff_package(bytes).unwrap_or(legacy))
            }
            Some(format) => Some(format),
            None => Self::sniff(bytes),
        }
    }

    /// Short label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Xlsx => "XLSX",
            Self::Xls => "XLS",
            Self::Pptx => "PPTX",
            Self::Ppt => "PPT",
            Self::Html => "HTML",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower-cased suffix after the last `.`; empty when there is none.
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Render rows as a GFM table. The first row is the header.
///
/// Rows are padded to the widest row; pipes and newlines inside cells are
/// escaped so the table stays on one line per row.
pub fn markdown_table(rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let render_row = |row: &[String]| -> String {
        let mut line = String::from("|");
        for i in 0..width {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(&escape_cell(cell));
            line.push_str(" |");
        }
        line
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(&rows[0]));
    lines.push(
        std::iter::once("|")
            .chain(std::iter::repeat_n(" --- |", width))
            .collect::<String>(),
    );
    for row in &rows[1..] {
        lines.push(render_row(row));
    }
    lines.join("\n")
}

fn escape_cell(cell: &str) -> String {
    cell.trim()
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_suffix() {
        assert_eq!(file_extension("Report.PDF"), "pdf");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn extension_wins_over_content() {
        assert_eq!(
            DocumentFormat::detect("notes.html", b"%PDF-1.7"),
            Some(DocumentFormat::Html)
        );
    }

    #[test]
    fn legacy_extension_on_ooxml_package_uses_contents() {
        use ooxml::test_support::build_package;

        let pptx = build_package(&[("ppt/presentation.xml", "<p:presentation/>")]);
        assert_eq!(DocumentFormat::detect("deck.ppt", &pptx), Some(DocumentFormat::Pptx));
        let xlsx = build_package(&[("xl/workbook.xml", "<workbook/>")]);
        assert_eq!(DocumentFormat::detect("Budget.XLS", &xlsx), Some(DocumentFormat::Xlsx));

        // Real binary files keep the extension's format.
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1];
        assert_eq!(DocumentFormat::detect("old.ppt", &ole), Some(DocumentFormat::Ppt));
        assert_eq!(DocumentFormat::detect("old.xls", &ole), Some(DocumentFormat::Xls));
        // A zip that is no office package stays as named.
        let other = build_package(&[("x.txt", "x")]);
        assert_eq!(DocumentFormat::detect("deck.ppt", &other), Some(DocumentFormat::Ppt));
    }

    #[test]
    fn sniff_when_extension_unknown() {
        assert_eq!(
            DocumentFormat::detect("upload.bin", b"%PDF-1.4\n"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::detect("page", b"\n  <!doctype html><html></html>"),
            Some(DocumentFormat::Html)
        );
        assert_eq!(
            DocumentFormat::detect("legacy.dat", &[0xD0, 0xCF, 0x11, 0xE0, 0xA1]),
            Some(DocumentFormat::Xls)
        );
        assert_eq!(DocumentFormat::detect("blob", b"\x00\x01\x02"), None);
    }

    #[test]
    fn table_pads_and_escapes() {
        let rows = vec![
            vec!["Name".to_string(), "Score".to_string()],
            vec!["a|b".to_string()],
        ];
        let table = markdown_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Name | Score |");
        assert_eq!(lines[1], "| --- | --- |");
        assert_eq!(lines[2], "| a\\|b |  |");
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(markdown_table(&[]), "");
    }
}
